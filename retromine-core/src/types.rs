use std::collections::HashMap;

use thiserror::Error;

use crate::config::ScoringMode;

/// Insertion-ordered template usage counts.
///
/// Templates keep the position at which they were first seen, so every pass
/// over the counts (deduplication, scoring) is deterministic for a given
/// input.
///
/// # Examples
///
/// ```rust
/// use retromine_core::types::TemplateCounts;
///
/// let counts: TemplateCounts = ["T1", "T2", "T1"].into_iter().collect();
/// assert_eq!(counts.get("T1"), 2);
/// assert_eq!(counts.total(), 3);
/// assert_eq!(counts.templates().collect::<Vec<_>>(), vec!["T1", "T2"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateCounts {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl TemplateCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds counts from explicit `(template, count)` pairs.
    ///
    /// Repeated templates accumulate into the first occurrence.
    pub fn from_pairs<S, I>(pairs: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, usize)>,
    {
        let mut counts = Self::new();
        for (template, count) in pairs {
            counts.add_count(template, count);
        }
        counts
    }

    /// Records one more use of `template`.
    pub fn add(&mut self, template: impl Into<String>) {
        self.add_count(template, 1);
    }

    /// Records `count` uses of `template`.
    pub fn add_count(&mut self, template: impl Into<String>, count: usize) {
        let template = template.into();
        match self.index.get(&template) {
            Some(&position) => self.entries[position].1 += count,
            None => {
                self.index.insert(template.clone(), self.entries.len());
                self.entries.push((template, count));
            }
        }
    }

    /// Count for `template`, zero when it was never seen.
    #[must_use]
    pub fn get(&self, template: &str) -> usize {
        self.index
            .get(template)
            .map_or(0, |&position| self.entries[position].1)
    }

    #[must_use]
    pub fn contains(&self, template: &str) -> bool {
        self.index.contains_key(template)
    }

    /// Number of distinct templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.entries
            .iter()
            .map(|(template, count)| (template.as_str(), *count))
    }

    pub fn templates(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(template, _)| template.as_str())
    }

    /// Keeps only the templates for which `keep` returns `true`.
    #[must_use]
    pub fn filtered(&self, mut keep: impl FnMut(&str) -> bool) -> Self {
        Self::from_pairs(
            self.iter()
                .filter(|(template, _)| keep(template))
                .map(|(template, count)| (template.to_string(), count)),
        )
    }
}

impl<S: Into<String>> FromIterator<S> for TemplateCounts {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut counts = Self::new();
        counts.extend(iter);
        counts
    }
}

impl<S: Into<String>> Extend<S> for TemplateCounts {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for template in iter {
            self.add(template);
        }
    }
}

/// Error types that can occur while scoring routes, mining templates or
/// merging templates into an expansion policy.
#[derive(Error, Debug)]
pub enum RetroMineError {
    /// Required cost-model materials or named components are missing
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Operation is undefined for the active scoring mode
    #[error("{operation} is not supported under {mode} scoring")]
    UnsupportedMode {
        /// Name of the rejected operation
        operation: &'static str,
        /// Scoring mode that was active
        mode: ScoringMode,
    },
    /// The chemistry toolkit could not apply a template to a structure
    #[error("Template application failed: {0}")]
    TemplateApplication(String),
    /// Any other chemistry toolkit failure
    #[error("Chemistry toolkit error: {0}")]
    Toolkit(String),
    /// Price predictor failure or malformed prediction
    #[error("Price prediction error: {0}")]
    Prediction(String),
    /// Persisted route data does not describe a valid route tree
    #[error("Invalid route: {0}")]
    InvalidRoute(String),
    /// Scores, priors or other arguments outside their valid range
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Error parsing tabular or plain-text input
    #[error("Parse error: {0}")]
    Parse(String),
}
