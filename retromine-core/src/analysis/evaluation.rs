use serde::{Deserialize, Serialize};

use crate::analysis::cheapest_solved;
use crate::analysis::statistics::mean;
use crate::config::ScoringMode;
use crate::constants::NUM_SOLVED_SATURATION;
use crate::route::RouteBatch;
use crate::scoring::RouteCostScorer;
use crate::types::RetroMineError;

/// How an optimised search compares with a standard search of the same
/// targets. All three scores lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceComparison {
    /// Fraction of jointly solved targets where the optimised search found
    /// a strictly cheaper route
    pub difference: f64,
    /// Fraction of newly solved targets whose best route beats the mean
    /// standard route cost
    #[serde(rename = "extra")]
    pub extra_solved: f64,
    /// Logarithmic score of the number of newly solved targets
    #[serde(rename = "num")]
    pub num_solved: f64,
}

/// Compares the best solved routes of two searches.
///
/// # Errors
///
/// Propagates route cost failures, including
/// [`RetroMineError::UnsupportedMode`] under frequency scoring.
pub fn compare_performance(
    standard: &RouteBatch,
    optimised: &RouteBatch,
    scorer: &mut RouteCostScorer,
    mode: ScoringMode,
) -> Result<PerformanceComparison, RetroMineError> {
    scorer.validate(mode)?;

    let mut both_solved = 0usize;
    let mut improved = 0usize;
    let mut standard_costs = Vec::new();
    let mut extra_best = Vec::new();

    for opt_target in optimised.solved_targets() {
        let Some((_, opt_best)) = cheapest_solved(scorer, opt_target, mode)? else {
            continue;
        };
        let standard_target = standard
            .get(&opt_target.target)
            .filter(|target| target.is_solved());
        match standard_target {
            Some(standard_target) => {
                both_solved += 1;
                let mut std_best = f64::INFINITY;
                for tree in standard_target.solved_trees() {
                    let cost = scorer.cost(tree, mode)?;
                    std_best = std_best.min(cost);
                    standard_costs.push(cost);
                }
                if opt_best < std_best {
                    improved += 1;
                }
            }
            None => extra_best.push(opt_best),
        }
    }

    let difference = if both_solved == 0 {
        0.0
    } else {
        improved as f64 / both_solved as f64
    };

    let extra_solved = if extra_best.is_empty() || standard_costs.is_empty() {
        0.0
    } else {
        let threshold = mean(&standard_costs);
        extra_best.iter().filter(|&&cost| cost < threshold).count() as f64
            / extra_best.len() as f64
    };

    let num_solved = ((1.0 + extra_best.len() as f64).ln() / NUM_SOLVED_SATURATION.ln())
        .clamp(0.0, 1.0);

    log::info!(
        "Both solved: {both_solved}, newly solved: {}, difference {difference:.3}",
        extra_best.len()
    );
    Ok(PerformanceComparison {
        difference,
        extra_solved,
        num_solved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::CostMaterials;
    use crate::test_support::{linear_route, target};

    #[test]
    fn test_compare_hand_built_collections() {
        let standard = RouteBatch::new([
            // costs 1.7 and 2.4
            target(
                "M1",
                vec![
                    linear_route("M1", &["a", "b"], true),
                    linear_route("M1", &["a", "b", "c"], true),
                ],
            ),
            // cost 1.0
            target("M2", vec![linear_route("M2", &["a"], true)]),
            target("M3", vec![linear_route("M3", &["a"], false)]),
        ]);
        let optimised = RouteBatch::new([
            target("M1", vec![linear_route("M1", &["n"], true)]),
            target("M2", vec![linear_route("M2", &["n", "m"], true)]),
            target("M3", vec![linear_route("M3", &["n", "m", "o"], true)]),
            target("M4", vec![linear_route("M4", &["n", "m", "o", "p"], true)]),
        ]);
        let mut scorer = RouteCostScorer::new(CostMaterials::default());

        let comparison =
            compare_performance(&standard, &optimised, &mut scorer, ScoringMode::State).unwrap();

        // mean standard cost over M1, M2 is (1.7 + 2.4 + 1.0) / 3 = 1.7
        // newly solved M3 and M4 cost 2.4 and 3.1
        assert!((comparison.difference - 0.5).abs() < 1e-12);
        assert_eq!(comparison.extra_solved, 0.0);
        assert!((comparison.num_solved - 3.0_f64.ln() / 20.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_extra_solved_below_mean() {
        let standard = RouteBatch::new([target("M1", vec![linear_route("M1", &["a", "b", "c"], true)])]);
        let optimised = RouteBatch::new([
            target("M1", vec![linear_route("M1", &["a", "b", "c"], true)]),
            target("M2", vec![linear_route("M2", &["n"], true)]),
        ]);
        let mut scorer = RouteCostScorer::new(CostMaterials::default());

        let comparison =
            compare_performance(&standard, &optimised, &mut scorer, ScoringMode::State).unwrap();
        assert_eq!(comparison.difference, 0.0);
        assert_eq!(comparison.extra_solved, 1.0);
    }

    #[test]
    fn test_empty_collections() {
        let mut scorer = RouteCostScorer::new(CostMaterials::default());
        let comparison = compare_performance(
            &RouteBatch::default(),
            &RouteBatch::default(),
            &mut scorer,
            ScoringMode::State,
        )
        .unwrap();
        assert_eq!(
            comparison,
            PerformanceComparison {
                difference: 0.0,
                extra_solved: 0.0,
                num_solved: 0.0,
            }
        );
    }

    #[test]
    fn test_num_solved_saturates() {
        let optimised = RouteBatch::new(
            (0..40).map(|i| target(&format!("M{i}"), vec![linear_route("M", &["n"], true)])),
        );
        let mut scorer = RouteCostScorer::new(CostMaterials::default());
        let comparison = compare_performance(
            &RouteBatch::default(),
            &optimised,
            &mut scorer,
            ScoringMode::State,
        )
        .unwrap();
        assert_eq!(comparison.num_solved, 1.0);
    }

    #[test]
    fn test_serialized_keys() {
        let comparison = PerformanceComparison {
            difference: 0.5,
            extra_solved: 0.25,
            num_solved: 0.0,
        };
        let value = serde_json::to_value(comparison).unwrap();
        assert_eq!(value, serde_json::json!({"difference": 0.5, "extra": 0.25, "num": 0.0}));
    }
}
