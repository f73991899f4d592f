//! Chemistry toolkit seam.
//!
//! Template canonicalization, application and similarity are delegated to a
//! [`ChemistryToolkit`]. The crate ships [`LexicalToolkit`], a string-level
//! implementation that needs no cheminformatics backend; bindings to a real
//! toolkit implement the same trait.

mod lexical;

pub use lexical::LexicalToolkit;

use rayon::prelude::*;

use crate::types::RetroMineError;

/// Operations the analysis needs from a cheminformatics toolkit.
///
/// Implementations must be thread-safe: canonicalization batches run on the
/// Rayon pool.
pub trait ChemistryToolkit: Send + Sync {
    /// Toolkit-normalized form of a template, atom-map numbering removed.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Toolkit`] when the template cannot be parsed.
    fn canonicalize(&self, template: &str) -> Result<String, RetroMineError>;

    /// Applies `template` to `structure`, returning every outcome as a list
    /// of product structures. An empty list means the template does not match.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::TemplateApplication`] when the toolkit
    /// fails to run the template.
    fn apply(&self, template: &str, structure: &str) -> Result<Vec<Vec<String>>, RetroMineError>;

    /// Similarity of two templates in `[0, 1]`; `1.0` means structurally
    /// identical.
    ///
    /// # Errors
    ///
    /// Returns [`RetroMineError::Toolkit`] when either template cannot be
    /// parsed.
    fn similarity(&self, a: &str, b: &str) -> Result<f64, RetroMineError>;
}

/// Canonical form of `template`, or the template itself when the toolkit
/// cannot parse it.
pub fn canonicalize_or_keep(toolkit: &dyn ChemistryToolkit, template: &str) -> String {
    match toolkit.canonicalize(template) {
        Ok(canonical) => canonical,
        Err(err) => {
            log::warn!("Keeping template as-is, canonicalization failed: {err}");
            template.to_string()
        }
    }
}

/// Canonicalizes a batch of templates in parallel, preserving input order.
pub fn canonicalize_all<S>(toolkit: &dyn ChemistryToolkit, templates: &[S]) -> Vec<String>
where
    S: AsRef<str> + Sync,
{
    templates
        .par_iter()
        .map(|template| canonicalize_or_keep(toolkit, template.as_ref()))
        .collect()
}
