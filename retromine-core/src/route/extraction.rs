use serde_json::Value;

use crate::route::tree::{MoleculeNode, ReactionNode};

/// Lazily yields every value stored under `key` anywhere in `value`.
///
/// Traversal is a pre-order walk: a mapping's own entry is yielded before
/// anything nested inside it, and sequence items are visited in order.
/// Scalars yield nothing.
///
/// # Examples
///
/// ```rust
/// use retromine_core::route::find_values;
/// use serde_json::json;
///
/// let route = json!({
///     "children": [{"metadata": {"template": "t1"}, "children": [
///         {"children": [{"metadata": {"template": "t2"}}]}
///     ]}]
/// });
/// let found: Vec<_> = find_values(&route, "template").collect();
/// assert_eq!(found, vec!["t1", "t2"]);
/// ```
pub fn find_values<'a>(value: &'a Value, key: &'a str) -> FindValues<'a> {
    FindValues {
        key,
        stack: vec![value],
    }
}

/// Iterator returned by [`find_values`].
#[derive(Debug, Clone)]
pub struct FindValues<'a> {
    key: &'a str,
    stack: Vec<&'a Value>,
}

impl<'a> Iterator for FindValues<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Value::Array(items) => self.stack.extend(items.iter().rev()),
                Value::Object(map) => {
                    self.stack.extend(map.values().rev());
                    if let Some(found) = map.get(self.key) {
                        return Some(found);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Pre-order iterator over the templates of a typed route tree.
///
/// Reactions without a template annotation are skipped.
#[derive(Debug, Clone)]
pub struct Templates<'a> {
    stack: Vec<&'a ReactionNode>,
}

impl<'a> Templates<'a> {
    pub(crate) fn new(root: &'a MoleculeNode) -> Self {
        Self {
            stack: root.children.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Templates<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(reaction) = self.stack.pop() {
            for molecule in reaction.children.iter().rev() {
                self.stack.extend(molecule.children.iter().rev());
            }
            if let Some(template) = reaction.template() {
                return Some(template);
            }
        }
        None
    }
}
