//! Template usage analysis over route search results.
//!
//! [`TemplateUsageAnalyser`] is parametrized by a [`ScoringMode`] and answers
//! three questions about one or two route collections:
//!
//! - which templates the cheapest routes rely on ([`popularity`])
//! - which templates an alternative route source uses that the primary
//!   search never did ([`unused`])
//! - which of those exist in a reference library ([`classification`])
//!
//! [`evaluation`] compares two searches of the same targets.

pub mod classification;
pub mod evaluation;
pub mod popularity;
pub mod statistics;
pub mod unused;

pub use classification::TemplateSplit;
pub use evaluation::{PerformanceComparison, compare_performance};

use std::sync::Arc;

use crate::chemistry::ChemistryToolkit;
use crate::config::{AnalysisConfig, ScoringMode};
use crate::dedup::TemplateDeduplicator;
use crate::route::TargetRoutes;
use crate::scoring::{CostMaterials, RouteCostScorer};
use crate::types::RetroMineError;

/// Scores and classifies templates found in route search output.
///
/// The analyser owns a memoizing [`RouteCostScorer`], so analysing the same
/// routes twice scores each route once.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use retromine_core::analysis::TemplateUsageAnalyser;
/// use retromine_core::chemistry::LexicalToolkit;
/// use retromine_core::config::{AnalysisConfig, ScoringMode};
/// use retromine_core::scoring::CostMaterials;
///
/// let config = AnalysisConfig {
///     scoring_mode: ScoringMode::StockCost,
///     ..Default::default()
/// };
/// // stock-cost needs a stock table
/// let result = TemplateUsageAnalyser::new(&config, Arc::new(LexicalToolkit), CostMaterials::default());
/// assert!(result.is_err());
/// ```
pub struct TemplateUsageAnalyser {
    mode: ScoringMode,
    merge_equivalent: bool,
    toolkit: Arc<dyn ChemistryToolkit>,
    scorer: RouteCostScorer,
}

impl TemplateUsageAnalyser {
    /// Creates an analyser for `config.scoring_mode`.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Configuration`] when the configuration is
    /// invalid or the cost mode's materials are missing.
    pub fn new(
        config: &AnalysisConfig,
        toolkit: Arc<dyn ChemistryToolkit>,
        materials: CostMaterials,
    ) -> Result<Self, RetroMineError> {
        config.validate()?;
        materials.validate(config.scoring_mode)?;
        Ok(Self {
            mode: config.scoring_mode,
            merge_equivalent: config.merge_equivalent_templates,
            toolkit,
            scorer: RouteCostScorer::new(materials)
                .with_not_in_stock_cost(config.not_in_stock_cost),
        })
    }

    #[must_use]
    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    #[must_use]
    pub fn scorer(&self) -> &RouteCostScorer {
        &self.scorer
    }

    pub fn scorer_mut(&mut self) -> &mut RouteCostScorer {
        &mut self.scorer
    }

    fn deduplicator(&self) -> TemplateDeduplicator<'_> {
        TemplateDeduplicator::new(self.toolkit.as_ref())
    }

    /// Position and cost of the cheapest solved route of `target`.
    fn cheapest_solved(
        &mut self,
        target: &TargetRoutes,
    ) -> Result<Option<(usize, f64)>, RetroMineError> {
        cheapest_solved(&mut self.scorer, target, self.mode)
    }
}

/// Position and cost of the cheapest solved route; the first one wins ties.
pub(crate) fn cheapest_solved(
    scorer: &mut RouteCostScorer,
    target: &TargetRoutes,
    mode: ScoringMode,
) -> Result<Option<(usize, f64)>, RetroMineError> {
    let mut best: Option<(usize, f64)> = None;
    for (position, tree) in target.trees.iter().enumerate() {
        if !tree.is_solved() {
            continue;
        }
        let cost = scorer.cost(tree, mode)?;
        match best {
            Some((_, best_cost)) if cost >= best_cost => {}
            _ => best = Some((position, cost)),
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockToolkit, linear_route, target};

    #[test]
    fn test_cheapest_skips_unsolved_and_keeps_first_tie() {
        let mut scorer = RouteCostScorer::new(CostMaterials::default());
        let routes = target(
            "M",
            vec![
                linear_route("M", &["a"], false),
                linear_route("M", &["b", "c"], true),
                linear_route("M", &["d"], true),
                linear_route("M", &["e"], true),
            ],
        );

        let (position, cost) = cheapest_solved(&mut scorer, &routes, ScoringMode::State)
            .unwrap()
            .unwrap();
        assert_eq!(position, 2);
        assert!((cost - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cheapest_of_unsolved_target_is_none() {
        let mut scorer = RouteCostScorer::new(CostMaterials::default());
        let routes = target("M", vec![linear_route("M", &["a"], false)]);
        assert!(
            cheapest_solved(&mut scorer, &routes, ScoringMode::State)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_construction_checks_materials() {
        let config = AnalysisConfig {
            scoring_mode: ScoringMode::MlPrice,
            ..Default::default()
        };
        let result =
            TemplateUsageAnalyser::new(&config, Arc::new(MockToolkit::new()), CostMaterials::default());
        assert!(matches!(result, Err(RetroMineError::Configuration(_))));

        let frequency = AnalysisConfig {
            scoring_mode: ScoringMode::Frequency,
            ..Default::default()
        };
        assert!(
            TemplateUsageAnalyser::new(
                &frequency,
                Arc::new(MockToolkit::new()),
                CostMaterials::default()
            )
            .is_ok()
        );
    }
}
