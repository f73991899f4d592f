use std::sync::Arc;

use crate::analysis::{PerformanceComparison, TemplateUsageAnalyser, compare_performance};
use crate::chemistry::ChemistryToolkit;
use crate::config::AnalysisConfig;
use crate::library::TemplateLibrary;
use crate::results::MiningResults;
use crate::route::RouteBatch;
use crate::scoring::{CostMaterials, RouteCostScorer};
use crate::types::RetroMineError;

/// High-level entry point tying configuration, toolkit and cost materials
/// together.
///
/// Each call to [`mine`](Self::mine) or [`compare`](Self::compare) starts
/// from a fresh cost cache.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use retromine_core::TemplateMiner;
/// use retromine_core::chemistry::LexicalToolkit;
/// use retromine_core::config::AnalysisConfig;
/// use retromine_core::library::TemplateLibrary;
/// use retromine_core::route::{MoleculeNode, ReactionNode, RouteBatch, RouteTree, TargetRoutes};
/// use retromine_core::scoring::CostMaterials;
///
/// let tree = RouteTree::new(MoleculeNode::made_by(
///     "CCO",
///     ReactionNode::new("[C:1]O>>[C:1]Br", vec![MoleculeNode::leaf("CCBr", true)]),
/// ));
/// let batch = RouteBatch::new([TargetRoutes::new("CCO", vec![tree])]);
///
/// let miner = TemplateMiner::new(
///     AnalysisConfig::default(),
///     Arc::new(LexicalToolkit),
///     CostMaterials::default(),
/// )?;
/// let results = miner.mine(&batch, None, &TemplateLibrary::new())?;
/// assert_eq!(results.popular.get("[C:1]O>>[C:1]Br"), Some(1.0));
/// assert!(results.unused.is_none());
/// # Ok::<(), retromine_core::types::RetroMineError>(())
/// ```
pub struct TemplateMiner {
    config: AnalysisConfig,
    toolkit: Arc<dyn ChemistryToolkit>,
    materials: CostMaterials,
}

impl TemplateMiner {
    /// Creates a miner after checking the configuration and cost materials.
    ///
    /// When `config.num_threads` is set, the global Rayon thread pool is
    /// sized once for the process.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Configuration`] for invalid settings,
    /// missing cost materials, or a thread pool already running with a
    /// different size.
    pub fn new(
        config: AnalysisConfig,
        toolkit: Arc<dyn ChemistryToolkit>,
        materials: CostMaterials,
    ) -> Result<Self, RetroMineError> {
        config.validate()?;
        materials.validate(config.scoring_mode)?;

        if let Some(num_threads) = config.num_threads {
            configure_thread_pool(num_threads)?;
        }

        Ok(Self {
            config,
            toolkit,
            materials,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Fresh analyser sharing this miner's toolkit and materials.
    ///
    /// # Errors
    ///
    /// Same as [`TemplateUsageAnalyser::new`].
    pub fn analyser(&self) -> Result<TemplateUsageAnalyser, RetroMineError> {
        TemplateUsageAnalyser::new(&self.config, Arc::clone(&self.toolkit), self.materials.clone())
    }

    /// Runs popularity scoring on `primary` and, given an alternative
    /// collection, unused-template mining and the overlooked/novel split.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::UnsupportedMode`] when an alternative is
    /// given under frequency scoring. Propagates cost and toolkit failures.
    pub fn mine(
        &self,
        primary: &RouteBatch,
        alternative: Option<&RouteBatch>,
        library: &TemplateLibrary,
    ) -> Result<MiningResults, RetroMineError> {
        let mut analyser = self.analyser()?;
        log::info!(
            "Mining templates from {} targets with {} scoring",
            primary.len(),
            self.config.scoring_mode
        );

        let popular = analyser.popular_templates(primary)?;
        let Some(alternative) = alternative else {
            return Ok(MiningResults {
                popular,
                ..Default::default()
            });
        };

        let unused = analyser.unused_templates(primary, alternative)?;
        let split = analyser.split_unused(&unused, library);
        log::info!(
            "Found {} unused templates: {} overlooked, {} novel",
            unused.len(),
            split.overlooked.len(),
            split.novel.len()
        );
        Ok(MiningResults {
            popular,
            unused: Some(unused),
            overlooked: split.overlooked,
            novel: split.novel,
        })
    }

    /// Compares an optimised search with a standard one.
    ///
    /// # Errors
    ///
    /// Same as [`compare_performance`].
    pub fn compare(
        &self,
        standard: &RouteBatch,
        optimised: &RouteBatch,
    ) -> Result<PerformanceComparison, RetroMineError> {
        let mut scorer = RouteCostScorer::new(self.materials.clone())
            .with_not_in_stock_cost(self.config.not_in_stock_cost);
        compare_performance(standard, optimised, &mut scorer, self.config.scoring_mode)
    }
}

fn configure_thread_pool(num_threads: usize) -> Result<(), RetroMineError> {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(()) => Ok(()),
        Err(_) if rayon::current_num_threads() == num_threads => {
            log::debug!("Thread pool already running with {num_threads} threads");
            Ok(())
        }
        Err(e) => Err(RetroMineError::Configuration(format!(
            "Failed to configure thread pool: {e}"
        ))),
    }
}
