use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_NOT_IN_STOCK_COST;
use crate::types::RetroMineError;

/// Cost model used to rank routes, or pure frequency counting.
///
/// # Modes
///
/// - **State**: route complexity from reaction and leaf counts only
/// - **StockCost**: leaf prices from a stock table plus complexity terms
/// - **MlPrice**: leaf prices from a price-prediction model plus complexity terms
/// - **Frequency**: no cost model; templates ranked by relative usage
///
/// # Examples
///
/// ```rust
/// use retromine_core::config::ScoringMode;
///
/// let mode: ScoringMode = "stock-cost".parse()?;
/// assert!(mode.is_cost_based());
/// assert_eq!(mode.to_string(), "stock-cost");
/// # Ok::<(), retromine_core::types::RetroMineError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringMode {
    /// `0.7 × reactions + 0.3 × leaves`.
    #[default]
    State,

    /// Stock-table leaf prices weighted with leaf and reaction counts.
    ///
    /// Requires a [`StockTable`](crate::scoring::StockTable).
    StockCost,

    /// Predicted leaf prices weighted with leaf and reaction counts.
    ///
    /// Requires a [`PricePredictor`](crate::scoring::PricePredictor).
    MlPrice,

    /// Relative template frequency, no per-route cost.
    Frequency,
}

impl ScoringMode {
    /// All modes, in CLI order.
    pub const ALL: [Self; 4] = [Self::State, Self::StockCost, Self::MlPrice, Self::Frequency];

    /// Whether the mode ranks individual routes by a cost.
    #[must_use]
    pub const fn is_cost_based(self) -> bool {
        !matches!(self, Self::Frequency)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::StockCost => "stock-cost",
            Self::MlPrice => "ml-price",
            Self::Frequency => "frequency",
        }
    }
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringMode {
    type Err = RetroMineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "state" => Ok(Self::State),
            "stock-cost" | "stock_cost" | "cost" => Ok(Self::StockCost),
            "ml-price" | "ml_price" | "coprinet" => Ok(Self::MlPrice),
            "frequency" => Ok(Self::Frequency),
            other => Err(RetroMineError::Configuration(format!(
                "unknown scoring mode '{other}' (expected one of: state, stock-cost, ml-price, frequency)"
            ))),
        }
    }
}

/// Output format options for template score tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON object mapping template to score, highest score first.
    #[default]
    Json,

    /// Tab-separated `template<TAB>score` rows with a header line.
    Tsv,
}

impl OutputFormat {
    /// File extension used when writing tables of this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Tsv => "tsv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = RetroMineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "tsv" => Ok(Self::Tsv),
            other => Err(RetroMineError::Configuration(format!(
                "unknown output format '{other}' (expected json or tsv)"
            ))),
        }
    }
}

/// Configuration settings for template mining.
///
/// The value is passed explicitly to every component that needs it; nothing
/// is read from the environment.
///
/// # Examples
///
/// ## Default configuration
///
/// ```rust
/// use retromine_core::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.not_in_stock_cost, 10.0);
/// ```
///
/// ## Stock-cost scoring with merged equivalent templates
///
/// ```rust
/// use retromine_core::config::{AnalysisConfig, ScoringMode};
///
/// let config = AnalysisConfig {
///     scoring_mode: ScoringMode::StockCost,
///     merge_equivalent_templates: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Cost model used to pick each target's cheapest route.
    ///
    /// **Default**: [`ScoringMode::State`]
    pub scoring_mode: ScoringMode,

    /// Price charged for a leaf molecule missing from the stock table.
    ///
    /// Only used by [`ScoringMode::StockCost`].
    ///
    /// **Default**: `10.0`
    pub not_in_stock_cost: f64,

    /// Merge structurally identical templates before computing popularity.
    ///
    /// Unused-template mining always merges; popularity only does when this
    /// is set.
    ///
    /// **Default**: `false`
    pub merge_equivalent_templates: bool,

    /// Format of written score tables.
    ///
    /// **Default**: [`OutputFormat::Json`]
    pub output_format: OutputFormat,

    /// Number of threads for parallel canonicalization.
    ///
    /// When set, configures the global Rayon thread pool. Set to `None`
    /// for automatic detection.
    ///
    /// **Default**: `None`
    pub num_threads: Option<usize>,

    /// Suppress the completion summary printed by front ends.
    ///
    /// **Default**: `false`
    pub quiet: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            scoring_mode: ScoringMode::State,
            not_in_stock_cost: DEFAULT_NOT_IN_STOCK_COST,
            merge_equivalent_templates: false,
            output_format: OutputFormat::Json,
            num_threads: None,
            quiet: false,
        }
    }
}

impl AnalysisConfig {
    /// Checks value ranges that the type system cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Configuration`] for a negative or
    /// non-finite fallback cost or a zero thread count.
    pub fn validate(&self) -> Result<(), RetroMineError> {
        if !self.not_in_stock_cost.is_finite() || self.not_in_stock_cost < 0.0 {
            return Err(RetroMineError::Configuration(format!(
                "not_in_stock_cost must be a non-negative number, got {}",
                self.not_in_stock_cost
            )));
        }
        if self.num_threads == Some(0) {
            return Err(RetroMineError::Configuration(
                "num_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
