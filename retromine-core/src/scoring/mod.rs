//! Route cost models.
//!
//! [`RouteCostScorer`] ranks candidate routes of a target so the analyser can
//! pick the cheapest one. Lower cost is better. Price-based modes need side
//! data, bundled in [`CostMaterials`]:
//!
//! | Mode | Formula | Needs |
//! |---|---|---|
//! | state | `0.7·reactions + 0.3·leaves` | nothing |
//! | stock-cost | `0.7·Σprice + 0.15·leaves + 0.15·reactions` | [`StockTable`] |
//! | ml-price | `0.7·Σprediction + 0.15·leaves + 0.15·reactions` | [`PricePredictor`] |
//!
//! Frequency mode has no per-route cost.

mod stock;

pub use stock::StockTable;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ScoringMode;
use crate::constants::{
    DEFAULT_NOT_IN_STOCK_COST, PRICE_LEAF_WEIGHT, PRICE_REACTION_WEIGHT, PRICE_WEIGHT,
    STATE_LEAF_WEIGHT, STATE_REACTION_WEIGHT,
};
use crate::route::{RouteHash, RouteTree};
use crate::types::RetroMineError;

/// Predicts purchase prices for molecules.
///
/// Called once per route with every leaf structure of that route.
pub trait PricePredictor: Send + Sync {
    /// Returns one price per structure, in input order.
    ///
    /// # Errors
    ///
    /// Implementations return [`RetroMineError::Prediction`] when the model
    /// cannot be evaluated.
    fn predict(&self, structures: &[String]) -> Result<Vec<f64>, RetroMineError>;
}

/// Side data used by the price-based cost modes.
#[derive(Clone, Default)]
pub struct CostMaterials {
    pub stock: Option<Arc<StockTable>>,
    pub predictor: Option<Arc<dyn PricePredictor>>,
}

impl CostMaterials {
    #[must_use]
    pub fn with_stock(mut self, stock: StockTable) -> Self {
        self.stock = Some(Arc::new(stock));
        self
    }

    #[must_use]
    pub fn with_predictor(mut self, predictor: Arc<dyn PricePredictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    /// Checks that `mode` has everything it needs.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Configuration`] when the stock table or the
    /// predictor required by `mode` is missing.
    pub fn validate(&self, mode: ScoringMode) -> Result<(), RetroMineError> {
        match mode {
            ScoringMode::StockCost if self.stock.is_none() => Err(RetroMineError::Configuration(
                "stock-cost scoring requires a stock table".to_string(),
            )),
            ScoringMode::MlPrice if self.predictor.is_none() => {
                Err(RetroMineError::Configuration(
                    "ml-price scoring requires a price predictor".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for CostMaterials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CostMaterials")
            .field("stock_entries", &self.stock.as_ref().map(|stock| stock.len()))
            .field("predictor", &self.predictor.is_some())
            .finish()
    }
}

/// Memoizing route cost calculator.
///
/// Costs are cached per `(structural hash, mode)`, so routes that differ only
/// in sibling order are scored once. The cache lives as long as the scorer.
///
/// # Examples
///
/// ```rust
/// use retromine_core::config::ScoringMode;
/// use retromine_core::route::{MoleculeNode, ReactionNode, RouteTree};
/// use retromine_core::scoring::{CostMaterials, RouteCostScorer};
///
/// let tree = RouteTree::new(MoleculeNode::made_by(
///     "T",
///     ReactionNode::new("t1", vec![MoleculeNode::leaf("A", true)]),
/// ));
/// let mut scorer = RouteCostScorer::new(CostMaterials::default());
/// let cost = scorer.cost(&tree, ScoringMode::State)?;
/// assert!((cost - 1.0).abs() < 1e-12);
/// # Ok::<(), retromine_core::types::RetroMineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RouteCostScorer {
    materials: CostMaterials,
    not_in_stock_cost: f64,
    cache: HashMap<(RouteHash, ScoringMode), f64>,
}

impl RouteCostScorer {
    pub fn new(materials: CostMaterials) -> Self {
        Self {
            materials,
            not_in_stock_cost: DEFAULT_NOT_IN_STOCK_COST,
            cache: HashMap::new(),
        }
    }

    /// Sets the price charged for leaves missing from the stock table.
    ///
    /// Drops any memoized costs, which were computed with the old price.
    #[must_use]
    pub fn with_not_in_stock_cost(mut self, cost: f64) -> Self {
        self.not_in_stock_cost = cost;
        self.cache.clear();
        self
    }

    #[must_use]
    pub fn not_in_stock_cost(&self) -> f64 {
        self.not_in_stock_cost
    }

    /// Checks up front that `mode` can be scored with the loaded materials.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Configuration`] for missing materials and
    /// [`RetroMineError::UnsupportedMode`] for frequency mode.
    pub fn validate(&self, mode: ScoringMode) -> Result<(), RetroMineError> {
        if !mode.is_cost_based() {
            return Err(RetroMineError::UnsupportedMode {
                operation: "route cost",
                mode,
            });
        }
        self.materials.validate(mode)
    }

    /// Cost of `tree` under `mode`, memoized.
    ///
    /// # Errors
    ///
    /// Same as [`validate`](Self::validate), plus predictor failures.
    pub fn cost(&mut self, tree: &RouteTree, mode: ScoringMode) -> Result<f64, RetroMineError> {
        let key = (tree.structural_hash(), mode);
        if let Some(&cost) = self.cache.get(&key) {
            return Ok(cost);
        }
        let cost = self.compute(tree, mode)?;
        self.cache.insert(key, cost);
        Ok(cost)
    }

    /// Cost of `tree` under `mode`, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Same as [`cost`](Self::cost).
    pub fn compute(&self, tree: &RouteTree, mode: ScoringMode) -> Result<f64, RetroMineError> {
        self.validate(mode)?;
        let leaves = tree.leaf_count() as f64;
        let reactions = tree.reaction_count() as f64;

        let cost = match mode {
            ScoringMode::State => STATE_REACTION_WEIGHT * reactions + STATE_LEAF_WEIGHT * leaves,
            ScoringMode::StockCost => {
                PRICE_WEIGHT * self.stock_sum(tree)?
                    + PRICE_LEAF_WEIGHT * leaves
                    + PRICE_REACTION_WEIGHT * reactions
            }
            ScoringMode::MlPrice => {
                PRICE_WEIGHT * self.predicted_sum(tree)?
                    + PRICE_LEAF_WEIGHT * leaves
                    + PRICE_REACTION_WEIGHT * reactions
            }
            ScoringMode::Frequency => {
                return Err(RetroMineError::UnsupportedMode {
                    operation: "route cost",
                    mode,
                });
            }
        };
        Ok(cost)
    }

    /// Number of memoized `(route, mode)` costs.
    #[must_use]
    pub fn cached_routes(&self) -> usize {
        self.cache.len()
    }

    fn stock_sum(&self, tree: &RouteTree) -> Result<f64, RetroMineError> {
        let stock = self.materials.stock.as_ref().ok_or_else(|| {
            RetroMineError::Configuration("stock-cost scoring requires a stock table".to_string())
        })?;
        let total = tree
            .leaves()
            .into_iter()
            .map(|leaf| {
                stock.price_of(leaf).unwrap_or_else(|| {
                    log::warn!(
                        "{} not found in stock table, using fallback cost {}",
                        leaf.stock_key(),
                        self.not_in_stock_cost
                    );
                    self.not_in_stock_cost
                })
            })
            .sum();
        Ok(total)
    }

    fn predicted_sum(&self, tree: &RouteTree) -> Result<f64, RetroMineError> {
        let predictor = self.materials.predictor.as_ref().ok_or_else(|| {
            RetroMineError::Configuration("ml-price scoring requires a price predictor".to_string())
        })?;
        let structures: Vec<String> = tree
            .leaves()
            .into_iter()
            .map(|leaf| leaf.smiles.clone())
            .collect();
        let prices = predictor.predict(&structures)?;
        if prices.len() != structures.len() {
            return Err(RetroMineError::Prediction(format!(
                "predictor returned {} prices for {} structures",
                prices.len(),
                structures.len()
            )));
        }
        Ok(prices.iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{MoleculeNode, ReactionNode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_log::test;

    struct CountingPredictor {
        price: f64,
        calls: AtomicUsize,
    }

    impl PricePredictor for CountingPredictor {
        fn predict(&self, structures: &[String]) -> Result<Vec<f64>, RetroMineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![self.price; structures.len()])
        }
    }

    struct ShortPredictor;

    impl PricePredictor for ShortPredictor {
        fn predict(&self, _structures: &[String]) -> Result<Vec<f64>, RetroMineError> {
            Ok(vec![1.0])
        }
    }

    /// T -> t1 -> [A, X]; X -> t2 -> [B]
    fn two_step_route(a: &str, b: &str) -> RouteTree {
        RouteTree::new(MoleculeNode::made_by(
            "T",
            ReactionNode::new(
                "t1",
                vec![
                    MoleculeNode::leaf(a, true),
                    MoleculeNode::made_by(
                        "X",
                        ReactionNode::new("t2", vec![MoleculeNode::leaf(b, true)]),
                    ),
                ],
            ),
        ))
    }

    #[test]
    fn test_state_cost() {
        let mut scorer = RouteCostScorer::new(CostMaterials::default());
        let cost = scorer.cost(&two_step_route("A", "B"), ScoringMode::State).unwrap();
        // 2 reactions, 2 leaves
        assert!((cost - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_stock_cost_with_fallback() {
        let stock: StockTable = [("A", 1.0)].into_iter().collect();
        let mut scorer = RouteCostScorer::new(CostMaterials::default().with_stock(stock))
            .with_not_in_stock_cost(4.0);

        let cost = scorer
            .cost(&two_step_route("A", "B"), ScoringMode::StockCost)
            .unwrap();
        let expected = 0.7 * (1.0 + 4.0) + 0.15 * 2.0 + 0.15 * 2.0;
        assert!((cost - expected).abs() < 1e-12);
    }

    #[test]
    fn test_default_fallback_cost() {
        let scorer = RouteCostScorer::new(CostMaterials::default().with_stock(StockTable::new()));
        let tree = RouteTree::new(MoleculeNode::leaf("Z", true));
        let cost = scorer.compute(&tree, ScoringMode::StockCost).unwrap();
        assert!((cost - (0.7 * 10.0 + 0.15)).abs() < 1e-12);
    }

    #[test]
    fn test_ml_price_batches_leaves() {
        let predictor = Arc::new(CountingPredictor {
            price: 2.0,
            calls: AtomicUsize::new(0),
        });
        let mut scorer =
            RouteCostScorer::new(CostMaterials::default().with_predictor(predictor.clone()));
        let tree = two_step_route("A", "B");

        let first = scorer.cost(&tree, ScoringMode::MlPrice).unwrap();
        let second = scorer.cost(&tree, ScoringMode::MlPrice).unwrap();

        let expected = 0.7 * 4.0 + 0.15 * 2.0 + 0.15 * 2.0;
        assert!((first - expected).abs() < 1e-12);
        assert_eq!(first, second);
        assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ml_price_length_mismatch() {
        let scorer =
            RouteCostScorer::new(CostMaterials::default().with_predictor(Arc::new(ShortPredictor)));
        let result = scorer.compute(&two_step_route("A", "B"), ScoringMode::MlPrice);
        assert!(matches!(result, Err(RetroMineError::Prediction(_))));
    }

    #[test]
    fn test_cache_shared_across_sibling_order() {
        let mut scorer = RouteCostScorer::new(CostMaterials::default());
        scorer.cost(&two_step_route("A", "B"), ScoringMode::State).unwrap();
        scorer.cost(&two_step_route("A", "B"), ScoringMode::State).unwrap();
        assert_eq!(scorer.cached_routes(), 1);

        let reordered = RouteTree::new(MoleculeNode::made_by(
            "T",
            ReactionNode::new(
                "t1",
                vec![
                    MoleculeNode::made_by(
                        "X",
                        ReactionNode::new("t2", vec![MoleculeNode::leaf("B", true)]),
                    ),
                    MoleculeNode::leaf("A", true),
                ],
            ),
        ));
        assert_eq!(reordered.structural_hash(), two_step_route("A", "B").structural_hash());
        let cached = scorer.cost(&reordered, ScoringMode::State).unwrap();
        assert_eq!(scorer.cached_routes(), 1);
        assert_eq!(cached, scorer.compute(&reordered, ScoringMode::State).unwrap());
    }

    #[test]
    fn test_memoized_cost_matches_fresh_compute() {
        let stock: StockTable = [("A", 1.5)].into_iter().collect();
        let predictor = Arc::new(CountingPredictor {
            price: 3.0,
            calls: AtomicUsize::new(0),
        });
        let materials = CostMaterials::default()
            .with_stock(stock)
            .with_predictor(predictor);
        let mut scorer = RouteCostScorer::new(materials);
        let tree = two_step_route("A", "B");

        for mode in [ScoringMode::State, ScoringMode::StockCost, ScoringMode::MlPrice] {
            let fresh = scorer.compute(&tree, mode).unwrap();
            assert_eq!(scorer.cost(&tree, mode).unwrap(), fresh, "first call, {mode}");
            assert_eq!(scorer.cost(&tree, mode).unwrap(), fresh, "cached call, {mode}");
        }
        assert_eq!(scorer.cached_routes(), 3);
    }

    #[test]
    fn test_reconfigured_fallback_drops_cache() {
        let tree = RouteTree::new(MoleculeNode::leaf("Z", true));
        let mut scorer = RouteCostScorer::new(CostMaterials::default().with_stock(StockTable::new()));
        let before = scorer.cost(&tree, ScoringMode::StockCost).unwrap();
        assert!((before - (0.7 * 10.0 + 0.15)).abs() < 1e-12);

        let mut scorer = scorer.with_not_in_stock_cost(2.0);
        assert_eq!(scorer.cached_routes(), 0);
        let after = scorer.cost(&tree, ScoringMode::StockCost).unwrap();
        assert!((after - (0.7 * 2.0 + 0.15)).abs() < 1e-12);
    }

    #[test]
    fn test_missing_materials() {
        let mut scorer = RouteCostScorer::new(CostMaterials::default());
        let tree = two_step_route("A", "B");
        assert!(matches!(
            scorer.cost(&tree, ScoringMode::StockCost),
            Err(RetroMineError::Configuration(_))
        ));
        assert!(matches!(
            scorer.cost(&tree, ScoringMode::MlPrice),
            Err(RetroMineError::Configuration(_))
        ));
        assert!(matches!(
            scorer.cost(&tree, ScoringMode::Frequency),
            Err(RetroMineError::UnsupportedMode { .. })
        ));
        assert_eq!(scorer.cached_routes(), 0);
    }
}
