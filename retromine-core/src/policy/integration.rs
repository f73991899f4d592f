use std::collections::HashSet;

use serde_json::Value;

use crate::chemistry::ChemistryToolkit;
use crate::constants::{
    EXTERNAL_POLICY_NAME, METADATA_CLASSIFICATION, METADATA_OPT_SCORE, METADATA_POLICY_NAME,
    METADATA_POLICY_PROBABILITY, NOVEL_CLASSIFICATION, OPTIMISED_CLASSIFICATION,
};
use crate::policy::ActionCandidate;
use crate::results::ScoreTable;
use crate::types::RetroMineError;

/// Folds mined template scores into one block of policy proposals.
///
/// Every merge returns priors that sum to one.
///
/// # Examples
///
/// ```rust
/// use retromine_core::chemistry::LexicalToolkit;
/// use retromine_core::policy::{ActionCandidate, PolicyTemplateIntegrator};
/// use retromine_core::results::ScoreTable;
///
/// let toolkit = LexicalToolkit;
/// let integrator = PolicyTemplateIntegrator::new(&toolkit);
/// let actions = vec![ActionCandidate::new("t1", 0.6), ActionCandidate::new("t2", 0.4)];
/// let popular = ScoreTable::from_scores([("t2", 1.0)]);
///
/// let boosted = integrator.merge_boost(actions, &popular)?;
/// // 0.4 + 1.0 * 0.2 = 0.6, then renormalized
/// assert!((boosted[1].prior - 0.5).abs() < 1e-9);
/// # Ok::<(), retromine_core::types::RetroMineError>(())
/// ```
#[derive(Clone, Copy)]
pub struct PolicyTemplateIntegrator<'a> {
    toolkit: &'a dyn ChemistryToolkit,
}

impl<'a> PolicyTemplateIntegrator<'a> {
    pub fn new(toolkit: &'a dyn ChemistryToolkit) -> Self {
        Self { toolkit }
    }

    /// Whether `template` applies to at least one of `molecules`.
    ///
    /// Application failures count as "does not apply".
    #[must_use]
    pub fn is_compatible(&self, template: &str, molecules: &[String]) -> bool {
        molecules.iter().any(|molecule| {
            match self.toolkit.apply(template, molecule) {
                Ok(outcomes) => !outcomes.is_empty(),
                Err(err) => {
                    log::debug!("Treating {template} as incompatible with {molecule}: {err}");
                    false
                }
            }
        })
    }

    /// Injects compatible novel templates as new proposals.
    ///
    /// Each injected candidate is a copy of the first proposal with its
    /// template replaced and its prior set to
    /// `(min + score·range) + score·range`, where `min` and `range` describe
    /// the incoming priors. The block is then renormalized and stably sorted
    /// by descending prior, even when nothing was injected. Templates
    /// already proposed are left alone. An empty block is returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::InvalidInput`] for scores outside `[0, 1]`,
    /// negative or non-finite priors, or a block whose priors sum to zero.
    pub fn merge_additive(
        &self,
        mut actions: Vec<ActionCandidate>,
        novel: &ScoreTable,
        molecules: &[String],
    ) -> Result<Vec<ActionCandidate>, RetroMineError> {
        validate_scores(novel)?;
        validate_priors(&actions)?;
        let Some(base) = actions.first().cloned() else {
            log::warn!("No proposals to copy, skipping {} novel templates", novel.len());
            return Ok(actions);
        };

        let proposed: HashSet<String> = actions.iter().map(|a| a.template.clone()).collect();
        let compatible: Vec<(&str, f64)> = novel
            .iter()
            .filter(|(template, _)| !proposed.contains(*template))
            .filter(|(template, _)| self.is_compatible(template, molecules))
            .collect();
        log::debug!(
            "Injecting {} of {} novel templates",
            compatible.len(),
            novel.len()
        );

        let (min, range) = prior_bounds(&actions);
        for (template, score) in compatible {
            let estimated = min + score * range;
            let prior = estimated + score * range;

            let mut injected = base.clone();
            injected.template = template.to_string();
            injected.prior = prior;
            let metadata = &mut injected.metadata;
            metadata.insert(METADATA_OPT_SCORE.to_string(), Value::from(score));
            metadata.insert(
                METADATA_CLASSIFICATION.to_string(),
                Value::from(NOVEL_CLASSIFICATION),
            );
            metadata.insert(
                METADATA_POLICY_NAME.to_string(),
                Value::from(EXTERNAL_POLICY_NAME),
            );
            metadata.insert(METADATA_POLICY_PROBABILITY.to_string(), Value::from(prior));
            actions.push(injected);
        }

        renormalize(&mut actions)?;
        actions.sort_by(|a, b| b.prior.total_cmp(&a.prior));
        Ok(actions)
    }

    /// Raises the prior of proposals whose template has a score.
    ///
    /// A matched proposal gains `score·range`, where `range` spans the
    /// incoming priors, and is tagged as optimised. The block is renormalized
    /// but keeps its order, so callers that need ranked proposals re-sort.
    ///
    /// # Errors
    ///
    /// Same as [`merge_additive`](Self::merge_additive).
    pub fn merge_boost(
        &self,
        mut actions: Vec<ActionCandidate>,
        optimised: &ScoreTable,
    ) -> Result<Vec<ActionCandidate>, RetroMineError> {
        validate_scores(optimised)?;
        validate_priors(&actions)?;
        if actions.is_empty() {
            return Ok(actions);
        }

        let (_, range) = prior_bounds(&actions);
        let mut boosted = 0usize;
        for action in &mut actions {
            let Some(score) = optimised.get(&action.template) else {
                continue;
            };
            action.prior += score * range;
            action.metadata.insert(
                METADATA_POLICY_PROBABILITY.to_string(),
                Value::from(action.prior),
            );
            action.metadata.insert(
                METADATA_CLASSIFICATION.to_string(),
                Value::from(OPTIMISED_CLASSIFICATION),
            );
            boosted += 1;
        }
        log::debug!("Boosted {boosted} of {} proposals", actions.len());

        renormalize(&mut actions)?;
        Ok(actions)
    }
}

fn validate_scores(scores: &ScoreTable) -> Result<(), RetroMineError> {
    match scores
        .iter()
        .find(|(_, score)| !(0.0..=1.0).contains(score))
    {
        Some((template, score)) => Err(RetroMineError::InvalidInput(format!(
            "score for {template} must lie in [0, 1], got {score}"
        ))),
        None => Ok(()),
    }
}

fn validate_priors(actions: &[ActionCandidate]) -> Result<(), RetroMineError> {
    match actions
        .iter()
        .find(|action| !action.prior.is_finite() || action.prior < 0.0)
    {
        Some(action) => Err(RetroMineError::InvalidInput(format!(
            "prior for {} must be a non-negative number, got {}",
            action.template, action.prior
        ))),
        None => Ok(()),
    }
}

/// Minimum prior and the spread between minimum and maximum.
fn prior_bounds(actions: &[ActionCandidate]) -> (f64, f64) {
    let min = actions
        .iter()
        .map(|action| action.prior)
        .fold(f64::INFINITY, f64::min);
    let max = actions
        .iter()
        .map(|action| action.prior)
        .fold(f64::NEG_INFINITY, f64::max);
    (min, max - min)
}

/// Scales priors so they sum to one.
pub(crate) fn renormalize(actions: &mut [ActionCandidate]) -> Result<(), RetroMineError> {
    let total: f64 = actions.iter().map(|action| action.prior).sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(RetroMineError::InvalidInput(format!(
            "cannot renormalize priors summing to {total}"
        )));
    }
    for action in actions.iter_mut() {
        action.prior /= total;
    }
    Ok(())
}
