use std::collections::HashSet;

use crate::analysis::{TemplateUsageAnalyser, cheapest_solved};
use crate::chemistry::canonicalize_all;
use crate::results::ScoreTable;
use crate::route::RouteBatch;
use crate::types::{RetroMineError, TemplateCounts};

impl TemplateUsageAnalyser {
    /// Finds templates that the alternative collection relies on and the
    /// primary collection never uses.
    ///
    /// For targets solved by both collections, only alternative routes
    /// strictly cheaper than the primary's best route contribute. For
    /// targets solved only by the alternative, every solved route does.
    /// Templates whose canonical form appears anywhere in the primary
    /// collection are dropped, equivalent templates are merged, and each
    /// survivor scores its count over its total count in the alternative
    /// collection.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::UnsupportedMode`] under frequency scoring,
    /// which has no cost basis for comparing the two collections. Propagates
    /// route cost and toolkit similarity failures.
    pub fn unused_templates(
        &mut self,
        primary: &RouteBatch,
        alternative: &RouteBatch,
    ) -> Result<ScoreTable, RetroMineError> {
        if !self.mode.is_cost_based() {
            return Err(RetroMineError::UnsupportedMode {
                operation: "unused template mining",
                mode: self.mode,
            });
        }

        let mut collected = TemplateCounts::new();
        for alt_target in alternative.solved_targets() {
            let primary_best = match primary.get(&alt_target.target) {
                Some(primary_target) => {
                    cheapest_solved(&mut self.scorer, primary_target, self.mode)?
                }
                None => None,
            };
            for tree in alt_target.solved_trees() {
                let cheaper = match primary_best {
                    Some((_, best)) => self.scorer.cost(tree, self.mode)? < best,
                    None => true,
                };
                if cheaper {
                    collected.extend(tree.templates());
                }
            }
        }
        log::info!(
            "Unused templates: {} of which {} are unique",
            collected.total(),
            collected.len()
        );

        let primary_templates: TemplateCounts = primary
            .all_trees()
            .flat_map(|tree| tree.templates())
            .collect();
        let primary_templates: Vec<&str> = primary_templates.templates().collect();
        let primary_canonical: HashSet<String> =
            canonicalize_all(self.toolkit.as_ref(), &primary_templates)
                .into_iter()
                .collect();

        let candidates: Vec<&str> = collected.templates().collect();
        let candidate_canonical = canonicalize_all(self.toolkit.as_ref(), &candidates);
        let absent: HashSet<&str> = candidates
            .iter()
            .zip(&candidate_canonical)
            .filter(|(_, canonical)| !primary_canonical.contains(*canonical))
            .map(|(template, _)| *template)
            .collect();
        let collected = collected.filtered(|template| absent.contains(template));

        let dedup = self.deduplicator();
        let unused = dedup.dedup(&collected, true)?;
        let alternative_totals: TemplateCounts = alternative
            .all_trees()
            .flat_map(|tree| tree.templates())
            .collect();
        let alternative_totals = dedup.dedup(&alternative_totals, false)?;

        Ok(ScoreTable::from_scores(unused.iter().map(|(template, count)| {
            let total = alternative_totals.get(template).max(count);
            (template, count as f64 / total as f64)
        })))
    }
}
