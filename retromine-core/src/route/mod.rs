//! Route trees reconstructed from persisted search output.
//!
//! A route alternates molecule and reaction nodes, starting from the target
//! molecule. Trees are immutable once built; analysis code only reads them.
//!
//! ## Modules
//!
//! - [`tree`]: Node types, [`RouteTree`], and per-target route collections
//! - [`extraction`]: Lazy recursive key search over nested JSON and typed trees
//! - [`hash`]: Order-independent structural digests used as memoization keys

pub mod extraction;
pub mod hash;
pub mod tree;

pub use extraction::{Templates, find_values};
pub use hash::RouteHash;
pub use tree::{MoleculeNode, ReactionMetadata, ReactionNode, RouteBatch, RouteTree, TargetRoutes};
