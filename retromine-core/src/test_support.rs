use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::chemistry::ChemistryToolkit;
use crate::route::{MoleculeNode, ReactionNode, RouteTree, TargetRoutes};
use crate::types::RetroMineError;

/// Configurable toolkit double.
///
/// Canonical forms default to `canon(<template>)`; templates are identical
/// only when declared equivalent.
#[derive(Debug, Default)]
pub(crate) struct MockToolkit {
    canonical: HashMap<String, String>,
    unparsable: HashSet<String>,
    equivalent: HashSet<(String, String)>,
    compatible: HashSet<String>,
    failing: HashSet<String>,
    pub similarity_calls: AtomicUsize,
}

impl MockToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canonical(mut self, template: &str, canonical: &str) -> Self {
        self.canonical
            .insert(template.to_string(), canonical.to_string());
        self
    }

    pub fn unparsable(mut self, template: &str) -> Self {
        self.unparsable.insert(template.to_string());
        self
    }

    pub fn equivalent(mut self, a: &str, b: &str) -> Self {
        self.equivalent.insert((a.to_string(), b.to_string()));
        self.equivalent.insert((b.to_string(), a.to_string()));
        self
    }

    pub fn compatible(mut self, template: &str) -> Self {
        self.compatible.insert(template.to_string());
        self
    }

    pub fn failing(mut self, template: &str) -> Self {
        self.failing.insert(template.to_string());
        self
    }

    pub fn similarity_calls(&self) -> usize {
        self.similarity_calls.load(Ordering::SeqCst)
    }
}

impl ChemistryToolkit for MockToolkit {
    fn canonicalize(&self, template: &str) -> Result<String, RetroMineError> {
        if self.unparsable.contains(template) {
            return Err(RetroMineError::Toolkit(format!("cannot parse {template}")));
        }
        Ok(self
            .canonical
            .get(template)
            .cloned()
            .unwrap_or_else(|| format!("canon({template})")))
    }

    fn apply(&self, template: &str, structure: &str) -> Result<Vec<Vec<String>>, RetroMineError> {
        if self.failing.contains(template) {
            return Err(RetroMineError::TemplateApplication(format!(
                "{template} failed on {structure}"
            )));
        }
        if self.compatible.contains(template) {
            Ok(vec![vec![format!("{structure}-precursor")]])
        } else {
            Ok(Vec::new())
        }
    }

    fn similarity(&self, a: &str, b: &str) -> Result<f64, RetroMineError> {
        self.similarity_calls.fetch_add(1, Ordering::SeqCst);
        if self.unparsable.contains(a) || self.unparsable.contains(b) {
            return Err(RetroMineError::Toolkit(format!("cannot compare {a} and {b}")));
        }
        let identical = a == b || self.equivalent.contains(&(a.to_string(), b.to_string()));
        Ok(if identical { 1.0 } else { 0.0 })
    }
}

/// Linear route `target -> t1 -> I1 -> t2 -> ... -> leaf`.
///
/// State cost is `0.7 * templates.len() + 0.3`.
pub(crate) fn linear_route(target: &str, templates: &[&str], solved: bool) -> RouteTree {
    let mut node = MoleculeNode::leaf(format!("{target}-start"), solved);
    for (depth, template) in templates.iter().enumerate().rev() {
        let smiles = if depth == 0 {
            target.to_string()
        } else {
            format!("{target}-I{depth}")
        };
        node = MoleculeNode::made_by(smiles, ReactionNode::new(*template, vec![node]));
    }
    RouteTree::new(node)
}

pub(crate) fn target(name: &str, trees: Vec<RouteTree>) -> TargetRoutes {
    TargetRoutes::new(name, trees)
}
