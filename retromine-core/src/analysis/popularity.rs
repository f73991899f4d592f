use crate::analysis::TemplateUsageAnalyser;
use crate::analysis::statistics::normalized_ranks;
use crate::results::ScoreTable;
use crate::route::RouteBatch;
use crate::types::{RetroMineError, TemplateCounts};

impl TemplateUsageAnalyser {
    /// Scores how often each template appears in the cheapest solved route
    /// of its target, relative to how often it appears at all.
    ///
    /// Only solved targets contribute. For each, the cheapest solved route
    /// feeds `used` and every candidate route feeds `all`, and a template
    /// scores `used(t) / all(t)`. Under frequency scoring the score is
    /// `all(t) / |all|`, normalized through [`normalized_ranks`].
    ///
    /// With `merge_equivalent_templates`, structurally identical templates
    /// are scored as one, keyed by the first one seen.
    ///
    /// # Errors
    ///
    /// Propagates route cost and toolkit similarity failures.
    pub fn popular_templates(&mut self, batch: &RouteBatch) -> Result<ScoreTable, RetroMineError> {
        let mut used = TemplateCounts::new();
        let mut all = TemplateCounts::new();

        for target in batch.solved_targets() {
            if self.mode.is_cost_based() {
                if let Some((best, _)) = self.cheapest_solved(target)? {
                    used.extend(target.trees[best].templates());
                }
            }
            for tree in &target.trees {
                all.extend(tree.templates());
            }
        }
        log::debug!(
            "Popularity over {} template uses ({} distinct)",
            all.total(),
            all.len()
        );

        if !self.mode.is_cost_based() {
            let all = if self.merge_equivalent {
                self.deduplicator().dedup(&all, true)?
            } else {
                all
            };
            return Ok(frequency_scores(&all));
        }

        if !self.merge_equivalent {
            return Ok(ScoreTable::from_scores(all.iter().map(|(template, total)| {
                (template, used.get(template) as f64 / total as f64)
            })));
        }

        let dedup = self.deduplicator();
        let representatives = dedup.representatives(&all)?;
        let mut merged_used = TemplateCounts::new();
        for (template, count) in used.iter() {
            let key = representatives
                .get(template)
                .map_or(template, String::as_str);
            merged_used.add_count(key, count);
        }
        let merged_all = dedup.dedup(&all, false)?;

        Ok(ScoreTable::from_scores(
            merged_all
                .iter()
                .filter(|(template, _)| {
                    representatives
                        .get(*template)
                        .map_or(true, |representative| representative == template)
                })
                .map(|(template, total)| {
                    (template, merged_used.get(template) as f64 / total as f64)
                }),
        ))
    }
}

fn frequency_scores(all: &TemplateCounts) -> ScoreTable {
    let total = all.total() as f64;
    let frequencies: Vec<f64> = all.iter().map(|(_, count)| count as f64 / total).collect();
    let ranks = normalized_ranks(&frequencies);
    ScoreTable::from_scores(all.templates().zip(ranks))
}
