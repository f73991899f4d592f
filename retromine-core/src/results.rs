use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Template scores ordered from best to worst.
///
/// Sorting is stable, so templates with equal scores keep the order in which
/// they were produced. Serializes as a JSON object whose key order is the
/// ranking.
///
/// # Examples
///
/// ```rust
/// use retromine_core::results::ScoreTable;
///
/// let table = ScoreTable::from_scores([("t1", 0.2), ("t2", 0.9), ("t3", 0.2)]);
/// let ranked: Vec<_> = table.templates().collect();
/// assert_eq!(ranked, vec!["t2", "t1", "t3"]);
/// assert_eq!(serde_json::to_string(&table)?, r#"{"t2":0.9,"t1":0.2,"t3":0.2}"#);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranks `(template, score)` pairs; a repeated template keeps its first score.
    pub fn from_scores<S, I>(scores: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, f64)>,
    {
        let mut seen = HashSet::new();
        let mut entries: Vec<(String, f64)> = scores
            .into_iter()
            .map(|(template, score)| (template.into(), score))
            .filter(|(template, _)| seen.insert(template.clone()))
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self::from_ranked(entries)
    }

    /// `entries` must already be ranked and free of repeats.
    fn from_ranked(entries: Vec<(String, f64)>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, (template, _))| (template.clone(), position))
            .collect();
        Self { entries, index }
    }

    #[must_use]
    pub fn get(&self, template: &str) -> Option<f64> {
        self.index
            .get(template)
            .map(|&position| self.entries[position].1)
    }

    #[must_use]
    pub fn contains(&self, template: &str) -> bool {
        self.index.contains_key(template)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries
            .iter()
            .map(|(template, score)| (template.as_str(), *score))
    }

    pub fn templates(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(template, _)| template.as_str())
    }

    /// Keeps the entries for which `keep` returns `true`, preserving rank.
    #[must_use]
    pub fn filtered(&self, mut keep: impl FnMut(&str, f64) -> bool) -> Self {
        Self::from_ranked(
            self.entries
                .iter()
                .filter(|(template, score)| keep(template, *score))
                .cloned()
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ScoreTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (template, score) in &self.entries {
            map.serialize_entry(template, score)?;
        }
        map.end()
    }
}

struct ScoreTableVisitor;

impl<'de> Visitor<'de> for ScoreTableVisitor {
    type Value = ScoreTable;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object mapping templates to scores")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut scores = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((template, score)) = access.next_entry::<String, f64>()? {
            scores.push((template, score));
        }
        Ok(ScoreTable::from_scores(scores))
    }
}

impl<'de> Deserialize<'de> for ScoreTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ScoreTableVisitor)
    }
}

/// Outcome of one mining run.
///
/// # Fields
///
/// - `popular`: popularity of every template seen in the primary collection
/// - `unused`: templates the alternative collection used and the primary
///   collection did not, when an alternative collection was given
/// - `overlooked`: unused templates present in the reference library
/// - `novel`: unused templates absent from the reference library
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MiningResults {
    pub popular: ScoreTable,
    pub unused: Option<ScoreTable>,
    pub overlooked: ScoreTable,
    pub novel: ScoreTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_template_keeps_first_score() {
        let table = ScoreTable::from_scores([("a", 0.1), ("b", 0.5), ("a", 0.9)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a"), Some(0.1));
        assert_eq!(table.templates().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_deserialize_reranks_in_document_order() {
        let table: ScoreTable =
            serde_json::from_str(r#"{"z": 0.3, "a": 0.3, "m": 0.7}"#).unwrap();
        assert_eq!(table.templates().collect::<Vec<_>>(), vec!["m", "z", "a"]);
    }

    #[test]
    fn test_filtered_preserves_rank() {
        let table = ScoreTable::from_scores([("a", 0.1), ("b", 0.5), ("c", 0.3)]);
        let kept = table.filtered(|template, _| template != "c");
        assert_eq!(kept.iter().collect::<Vec<_>>(), vec![("b", 0.5), ("a", 0.1)]);
    }

    #[test]
    fn test_lookup_follows_ranking_and_filtering() {
        let table = ScoreTable::from_scores((0..100).map(|i| (format!("t{i}"), f64::from(i) / 100.0)));
        assert_eq!(table.templates().next(), Some("t99"));
        assert_eq!(table.get("t42"), Some(0.42));
        assert!(!table.contains("t100"));

        let kept = table.filtered(|_, score| score < 0.5);
        assert_eq!(kept.len(), 50);
        assert_eq!(kept.get("t42"), Some(0.42));
        assert_eq!(kept.get("t77"), None);
        assert_eq!(kept, ScoreTable::from_scores(kept.iter()));
    }

    #[test]
    fn test_rejects_non_numeric_scores() {
        assert!(serde_json::from_str::<ScoreTable>(r#"{"a": "high"}"#).is_err());
    }
}
