//! # RetroMine - Reaction Template Mining
//!
//! Mines reaction templates from retrosynthesis search output and feeds the
//! best of them back into an expansion policy.
//!
//! ## Overview
//!
//! A retrosynthesis search produces, for every target molecule, a set of
//! route trees that alternate molecules and reactions. Each reaction was
//! proposed by applying a reaction template. This library answers two
//! questions about those templates:
//!
//! - Which templates does the search rely on in its cheapest solved routes?
//! - Which templates did a second, alternative search use to reach cheaper
//!   routes that the first one never found?
//!
//! The answers are ranked score tables that can be merged back into the
//! prior distribution of an expansion policy.
//!
//! ## Features
//!
//! - **Route Costing**: State, stock-price, predicted-price and frequency
//!   scoring, memoized by structural route hash
//! - **Template Deduplication**: Equivalence classes over a pluggable
//!   chemistry toolkit
//! - **Usage Analysis**: Popular, unused, overlooked and novel templates
//! - **Policy Integration**: Additive injection and prior boosting
//! - **Parallel Processing**: Canonicalization runs on Rayon
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use retromine_core::TemplateMiner;
//! use retromine_core::chemistry::LexicalToolkit;
//! use retromine_core::config::AnalysisConfig;
//! use retromine_core::io::{read_route_batch, read_template_library};
//! use retromine_core::scoring::CostMaterials;
//!
//! let primary = read_route_batch("standard_routes.json")?;
//! let alternative = read_route_batch("alternative_routes.json")?;
//! let library = read_template_library("reference_templates.txt")?;
//!
//! let miner = TemplateMiner::new(
//!     AnalysisConfig::default(),
//!     Arc::new(LexicalToolkit),
//!     CostMaterials::default(),
//! )?;
//! let results = miner.mine(&primary, Some(&alternative), &library)?;
//!
//! println!("{} popular, {} novel", results.popular.len(), results.novel.len());
//! # Ok::<(), retromine_core::types::RetroMineError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`config`]: Scoring modes and analysis configuration
//! - [`engine`]: The [`TemplateMiner`] facade
//! - [`route`]: Route trees, template extraction and structural hashing
//! - [`scoring`]: Route cost models and their materials
//! - [`chemistry`]: Toolkit abstraction for template comparison
//! - [`dedup`]: Structural template deduplication
//! - [`analysis`]: Template usage analysis and search comparison
//! - [`policy`]: Expansion policies and template integration
//! - [`library`]: Reference template libraries
//! - [`results`]: Ranked score tables
//! - [`io`]: Readers for routes, stock and libraries
//! - [`output`]: Score table writers
//! - [`types`]: Shared types and the error enum
//!
//! ## Error Handling
//!
//! All fallible operations return
//! [`Result<T, RetroMineError>`](types::RetroMineError), covering:
//!
//! - Missing cost-model materials or unknown components
//! - Operations undefined under the active scoring mode
//! - Chemistry toolkit and price predictor failures
//! - Malformed route, score or table input
//! - I/O errors during file operations

pub mod analysis;
pub mod chemistry;
pub mod config;
pub mod constants;
pub mod dedup;
pub mod engine;
pub mod io;
pub mod library;
pub mod output;
pub mod policy;
pub mod results;
pub mod route;
pub mod scoring;
pub mod types;

#[cfg(test)]
mod test_support;

pub use engine::TemplateMiner;
