//! Merging of structurally identical templates.
//!
//! Two templates are treated as the same when their strings match or the
//! toolkit rates their similarity at exactly `1.0`. Classes are built in a
//! single pass over the counts: each template not yet assigned opens a class
//! and absorbs every later unassigned template equal to it.

use std::collections::HashMap;

use crate::chemistry::ChemistryToolkit;
use crate::constants::EXACT_SIMILARITY;
use crate::types::{RetroMineError, TemplateCounts};

/// Groups templates into equivalence classes and merges their counts.
///
/// Runs `O(n²)` similarity comparisons in the worst case.
///
/// # Examples
///
/// ```rust
/// use retromine_core::chemistry::LexicalToolkit;
/// use retromine_core::dedup::TemplateDeduplicator;
/// use retromine_core::types::TemplateCounts;
///
/// let counts = TemplateCounts::from_pairs([("[C:1]>>[O:1]", 2), ("[C:7]>>[O:7]", 3)]);
/// let toolkit = LexicalToolkit;
/// let dedup = TemplateDeduplicator::new(&toolkit);
///
/// let merged = dedup.dedup(&counts, true)?;
/// assert_eq!(merged.iter().collect::<Vec<_>>(), vec![("[C:1]>>[O:1]", 5)]);
/// # Ok::<(), retromine_core::types::RetroMineError>(())
/// ```
#[derive(Clone, Copy)]
pub struct TemplateDeduplicator<'a> {
    toolkit: &'a dyn ChemistryToolkit,
}

impl<'a> TemplateDeduplicator<'a> {
    pub fn new(toolkit: &'a dyn ChemistryToolkit) -> Self {
        Self { toolkit }
    }

    /// Whether `a` and `b` denote the same template.
    ///
    /// Identical strings never reach the toolkit.
    ///
    /// # Errors
    ///
    /// Propagates toolkit similarity failures.
    pub fn equal(&self, a: &str, b: &str) -> Result<bool, RetroMineError> {
        if a == b {
            return Ok(true);
        }
        Ok(self.toolkit.similarity(a, b)? == EXACT_SIMILARITY)
    }

    /// Equivalence classes as positions into `counts`, in first-seen order.
    ///
    /// The first member of each class is its representative.
    ///
    /// # Errors
    ///
    /// Propagates toolkit similarity failures.
    pub fn classes(&self, counts: &TemplateCounts) -> Result<Vec<Vec<usize>>, RetroMineError> {
        let templates: Vec<&str> = counts.templates().collect();
        let mut assigned = vec![false; templates.len()];
        let mut classes = Vec::new();

        for (i, template) in templates.iter().enumerate() {
            if assigned[i] {
                continue;
            }
            assigned[i] = true;
            let mut class = vec![i];
            for j in (i + 1)..templates.len() {
                if !assigned[j] && self.equal(template, templates[j])? {
                    assigned[j] = true;
                    class.push(j);
                }
            }
            classes.push(class);
        }
        Ok(classes)
    }

    /// Maps every template in `counts` to its class representative.
    ///
    /// # Errors
    ///
    /// Propagates toolkit similarity failures.
    pub fn representatives(
        &self,
        counts: &TemplateCounts,
    ) -> Result<HashMap<String, String>, RetroMineError> {
        let templates: Vec<&str> = counts.templates().collect();
        let mut representatives = HashMap::with_capacity(templates.len());
        for class in self.classes(counts)? {
            let representative = templates[class[0]];
            for &member in &class {
                representatives.insert(templates[member].to_string(), representative.to_string());
            }
        }
        Ok(representatives)
    }

    /// Merges the counts of equivalent templates.
    ///
    /// With `combine`, each class collapses into its first-seen member
    /// carrying the class total. Without it, every original template is kept
    /// and carries its class total.
    ///
    /// # Errors
    ///
    /// Propagates toolkit similarity failures.
    pub fn dedup(
        &self,
        counts: &TemplateCounts,
        combine: bool,
    ) -> Result<TemplateCounts, RetroMineError> {
        let entries: Vec<(&str, usize)> = counts.iter().collect();
        let classes = self.classes(counts)?;

        let mut totals = vec![0usize; entries.len()];
        let mut merged = TemplateCounts::new();
        for class in &classes {
            let total: usize = class.iter().map(|&member| entries[member].1).sum();
            if combine {
                merged.add_count(entries[class[0]].0, total);
            } else {
                for &member in class {
                    totals[member] = total;
                }
            }
        }

        if combine {
            log::debug!(
                "Merged {} templates into {} classes",
                entries.len(),
                merged.len()
            );
            return Ok(merged);
        }
        Ok(TemplateCounts::from_pairs(
            entries
                .iter()
                .zip(totals)
                .map(|(&(template, _), total)| (template, total)),
        ))
    }
}
