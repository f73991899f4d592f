// =============================================================================
// Route cost weights
// =============================================================================

/// Weight of the reaction count in the state cost
pub const STATE_REACTION_WEIGHT: f64 = 0.7;

/// Weight of the leaf count in the state cost
pub const STATE_LEAF_WEIGHT: f64 = 0.3;

/// Weight of the summed leaf prices in price-based costs
pub const PRICE_WEIGHT: f64 = 0.7;

/// Weight of the leaf count in price-based costs
pub const PRICE_LEAF_WEIGHT: f64 = 0.15;

/// Weight of the reaction count in price-based costs
pub const PRICE_REACTION_WEIGHT: f64 = 0.15;

/// Price charged for a leaf that is missing from the stock table
pub const DEFAULT_NOT_IN_STOCK_COST: f64 = 10.0;

// =============================================================================
// Template comparison
// =============================================================================

/// Similarity at which two templates are considered structurally identical
pub const EXACT_SIMILARITY: f64 = 1.0;

/// Score given to every template when frequency scores have no spread
pub const FLAT_FREQUENCY_SCORE: f64 = 0.5;

/// Key under which route reaction nodes store their template
pub const TEMPLATE_KEY: &str = "template";

// =============================================================================
// Policy integration
// =============================================================================

/// Allowed deviation of a merged prior set from a unit sum
pub const PRIOR_SUM_TOLERANCE: f64 = 1e-6;

/// Classification given to injected novel templates
pub const NOVEL_CLASSIFICATION: &str = "novel";

/// Classification given to boosted popular/overlooked templates
pub const OPTIMISED_CLASSIFICATION: &str = "optimised";

/// Provenance tag of templates injected from an external source
pub const EXTERNAL_POLICY_NAME: &str = "external";

/// Action metadata key holding the classification label
pub const METADATA_CLASSIFICATION: &str = "classification";

/// Action metadata key holding the provenance tag
pub const METADATA_POLICY_NAME: &str = "policy_name";

/// Action metadata key holding the external quality score
pub const METADATA_OPT_SCORE: &str = "opt_score";

/// Action metadata key holding the unnormalized prior
pub const METADATA_POLICY_PROBABILITY: &str = "policy_probability";

// =============================================================================
// Performance comparison
// =============================================================================

/// Number of extra solved targets that saturates the solved-count score
pub const NUM_SOLVED_SATURATION: f64 = 20.0;
