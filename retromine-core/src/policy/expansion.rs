use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chemistry::ChemistryToolkit;
use crate::io::read_score_table;
use crate::policy::integration::{PolicyTemplateIntegrator, renormalize};
use crate::policy::{ActionCandidate, OptimisationKind};
use crate::results::ScoreTable;
use crate::types::RetroMineError;

/// Built-in strategy replaying proposals from a JSON table
pub const PRECOMPUTED_STRATEGY: &str = "precomputed";

/// Source of template proposals for query molecules.
pub trait ExpansionStrategy: Send + Sync {
    /// Name under which the strategy is loaded
    fn key(&self) -> &str;

    /// Proposals for `molecules`, priors summing to one.
    ///
    /// # Errors
    ///
    /// Implementation specific.
    fn get_actions(&self, molecules: &[String]) -> Result<Vec<ActionCandidate>, RetroMineError>;
}

/// Strategy that replays stored proposals per molecule.
///
/// The backing table maps a molecule to its proposals:
///
/// ```json
/// {"CCO": [{"template": "[C:1]O>>[C:1]Br", "prior": 0.7}, ...]}
/// ```
#[derive(Debug, Clone)]
pub struct PrecomputedStrategy {
    key: String,
    table: HashMap<String, Vec<ActionCandidate>>,
}

impl PrecomputedStrategy {
    pub fn new(key: impl Into<String>, table: HashMap<String, Vec<ActionCandidate>>) -> Self {
        Self {
            key: key.into(),
            table,
        }
    }

    /// Reads the proposal table from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Json`] for malformed tables.
    pub fn from_reader<R: Read>(key: impl Into<String>, reader: R) -> Result<Self, RetroMineError> {
        let table = serde_json::from_reader(reader)?;
        Ok(Self::new(key, table))
    }

    fn from_config(config: &StrategyConfig) -> Result<Box<dyn ExpansionStrategy>, RetroMineError> {
        let source = config.source.as_ref().ok_or_else(|| {
            RetroMineError::Configuration(format!(
                "strategy '{}' of type '{PRECOMPUTED_STRATEGY}' needs a source file",
                config.key
            ))
        })?;
        let reader = BufReader::new(File::open(source)?);
        Ok(Box::new(Self::from_reader(config.key.clone(), reader)?))
    }
}

impl ExpansionStrategy for PrecomputedStrategy {
    fn key(&self) -> &str {
        &self.key
    }

    fn get_actions(&self, molecules: &[String]) -> Result<Vec<ActionCandidate>, RetroMineError> {
        let mut actions: Vec<ActionCandidate> = molecules
            .iter()
            .filter_map(|molecule| self.table.get(molecule))
            .flatten()
            .cloned()
            .collect();
        if !actions.is_empty() {
            renormalize(&mut actions)?;
        }
        Ok(actions)
    }
}

/// Declarative description of a strategy to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Name the strategy is loaded under
    pub key: String,
    /// Registered strategy type
    #[serde(rename = "type")]
    pub kind: String,
    /// Backing file, for strategies that read one
    #[serde(default)]
    pub source: Option<PathBuf>,
}

/// Builds a strategy from its configuration.
pub type StrategyConstructor =
    fn(&StrategyConfig) -> Result<Box<dyn ExpansionStrategy>, RetroMineError>;

/// Named strategy constructors.
///
/// # Examples
///
/// ```rust
/// use retromine_core::policy::{StrategyConfig, StrategyRegistry};
///
/// let registry = StrategyRegistry::with_builtins();
/// assert_eq!(registry.names().collect::<Vec<_>>(), vec!["precomputed"]);
///
/// let config = StrategyConfig {
///     key: "uspto".to_string(),
///     kind: "keras".to_string(),
///     source: None,
/// };
/// assert!(registry.build(&config).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    constructors: BTreeMap<String, StrategyConstructor>,
}

impl StrategyRegistry {
    /// Registry with no strategies.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the built-in strategies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(PRECOMPUTED_STRATEGY, PrecomputedStrategy::from_config);
        registry
    }

    /// Adds or replaces the constructor for `name`.
    pub fn register(&mut self, name: impl Into<String>, constructor: StrategyConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.constructors.keys().map(String::as_str)
    }

    /// Builds the strategy `config` describes.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Configuration`] for unregistered types,
    /// plus whatever the constructor reports.
    pub fn build(
        &self,
        config: &StrategyConfig,
    ) -> Result<Box<dyn ExpansionStrategy>, RetroMineError> {
        let constructor = self.constructors.get(&config.kind).ok_or_else(|| {
            RetroMineError::Configuration(format!(
                "unknown expansion strategy type '{}' for '{}'",
                config.kind, config.key
            ))
        })?;
        constructor(config)
    }
}

/// Mined templates applied to every selected strategy's proposals.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyOptimisation {
    pub kind: OptimisationKind,
    pub templates: ScoreTable,
}

impl PolicyOptimisation {
    /// Loads the templates from a score table written by a mining run.
    ///
    /// # Errors
    ///
    /// Same as [`read_score_table`].
    pub fn from_file(kind: OptimisationKind, path: impl AsRef<Path>) -> Result<Self, RetroMineError> {
        let path = path.as_ref();
        let templates = read_score_table(path)?;
        log::info!(
            "Loaded {} {kind} templates from {}",
            templates.len(),
            path.display()
        );
        Ok(Self { kind, templates })
    }
}

/// Loaded expansion strategies, the active selection, and an optional
/// template optimisation.
pub struct ExpansionPolicy {
    strategies: BTreeMap<String, Box<dyn ExpansionStrategy>>,
    selection: Vec<String>,
    optimisation: Option<PolicyOptimisation>,
    toolkit: Arc<dyn ChemistryToolkit>,
}

impl ExpansionPolicy {
    pub fn new(toolkit: Arc<dyn ChemistryToolkit>) -> Self {
        Self {
            strategies: BTreeMap::new(),
            selection: Vec::new(),
            optimisation: None,
            toolkit,
        }
    }

    /// Adds a strategy under its own key, replacing any previous one.
    pub fn load(&mut self, strategy: Box<dyn ExpansionStrategy>) {
        self.strategies.insert(strategy.key().to_string(), strategy);
    }

    /// Builds and loads every configured strategy.
    ///
    /// # Errors
    ///
    /// Fails on the first strategy the registry cannot build.
    pub fn load_from_config(
        &mut self,
        registry: &StrategyRegistry,
        configs: &[StrategyConfig],
    ) -> Result<(), RetroMineError> {
        for config in configs {
            self.load(registry.build(config)?);
            log::debug!("Loaded expansion strategy {} ({})", config.key, config.kind);
        }
        Ok(())
    }

    /// Adds a loaded strategy to the selection.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Configuration`] when `key` is not loaded.
    pub fn select(&mut self, key: &str) -> Result<(), RetroMineError> {
        if !self.strategies.contains_key(key) {
            return Err(RetroMineError::Configuration(format!(
                "expansion strategy '{key}' is not loaded"
            )));
        }
        if !self.selection.iter().any(|selected| selected == key) {
            self.selection.push(key.to_string());
        }
        Ok(())
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
    }

    #[must_use]
    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn set_optimisation(&mut self, optimisation: Option<PolicyOptimisation>) {
        self.optimisation = optimisation;
    }

    /// Proposals of every selected strategy, in selection order.
    ///
    /// Each strategy's block is merged with the optimisation templates on its
    /// own, so every block's priors sum to one.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Configuration`] when nothing is selected or
    /// a selected strategy is missing. Propagates strategy and merge errors.
    pub fn get_actions(&self, molecules: &[String]) -> Result<Vec<ActionCandidate>, RetroMineError> {
        if self.selection.is_empty() {
            return Err(RetroMineError::Configuration(
                "no expansion strategy selected".to_string(),
            ));
        }

        let integrator = PolicyTemplateIntegrator::new(self.toolkit.as_ref());
        let mut all_actions = Vec::new();
        for key in &self.selection {
            let strategy = self.strategies.get(key).ok_or_else(|| {
                RetroMineError::Configuration(format!("expansion strategy '{key}' is not loaded"))
            })?;
            let actions = strategy.get_actions(molecules)?;
            let actions = match &self.optimisation {
                Some(PolicyOptimisation { kind, templates }) if kind.is_additive() => {
                    integrator.merge_additive(actions, templates, molecules)?
                }
                Some(PolicyOptimisation { templates, .. }) => {
                    integrator.merge_boost(actions, templates)?
                }
                None => actions,
            };
            all_actions.extend(actions);
        }
        Ok(all_actions)
    }
}
