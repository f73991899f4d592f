use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::route::MoleculeNode;

/// Purchase prices of starting materials, keyed by structure identifier.
///
/// Keys are usually InChIKeys; structure strings work equally well as long
/// as the routes use the same convention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockTable {
    prices: HashMap<String, f64>,
}

impl StockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, price: f64) {
        self.prices.insert(key.into(), price);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.prices.get(key).copied()
    }

    /// Price of a molecule, trying its stock key first and then its
    /// structure string.
    #[must_use]
    pub fn price_of(&self, molecule: &MoleculeNode) -> Option<f64> {
        self.get(molecule.stock_key())
            .or_else(|| self.get(&molecule.smiles))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for StockTable {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().map(|(key, price)| (key.into(), price)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_lookup_prefers_stock_key() {
        let stock: StockTable = [("KEY-A", 2.0), ("CCO", 5.0)].into_iter().collect();

        let keyed = MoleculeNode::leaf("CCO", true).with_inchi_key("KEY-A");
        assert_eq!(stock.price_of(&keyed), Some(2.0));

        let unkeyed = MoleculeNode::leaf("CCO", true);
        assert_eq!(stock.price_of(&unkeyed), Some(5.0));

        let stale_key = MoleculeNode::leaf("CCO", true).with_inchi_key("KEY-B");
        assert_eq!(stock.price_of(&stale_key), Some(5.0));

        assert_eq!(stock.price_of(&MoleculeNode::leaf("CCN", true)), None);
    }

    #[test]
    fn test_deserializes_from_plain_object() {
        let stock: StockTable = serde_json::from_str(r#"{"A": 1.5, "B": 0.25}"#).unwrap();
        assert_eq!(stock.len(), 2);
        assert_eq!(stock.get("B"), Some(0.25));
    }
}
