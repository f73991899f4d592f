use std::collections::BTreeMap;

use crate::chemistry::ChemistryToolkit;
use crate::constants::EXACT_SIMILARITY;
use crate::types::RetroMineError;

const SIDE_SEPARATOR: &str = ">>";
const COMPONENT_SEPARATOR: char = '.';

/// String-level template toolkit.
///
/// Canonicalization removes atom-map numbers from bracket atoms and sorts the
/// `.`-separated components on each side of `>>`. Two templates are
/// identical when their canonical forms match; otherwise similarity is the
/// multiset Jaccard index of their components.
///
/// The toolkit has no substructure matcher, so [`apply`](Self::apply)
/// always fails with [`RetroMineError::TemplateApplication`].
///
/// # Examples
///
/// ```rust
/// use retromine_core::chemistry::{ChemistryToolkit, LexicalToolkit};
///
/// let toolkit = LexicalToolkit;
/// let canonical = toolkit.canonicalize("[OH:3][C:1].[Br:2]>>[C:1][Br:2]")?;
/// assert_eq!(canonical, "[Br].[OH][C]>>[C][Br]");
/// assert_eq!(toolkit.similarity("[C:1]>>[N:1]", "[C:2]>>[N:2]")?, 1.0);
/// # Ok::<(), retromine_core::types::RetroMineError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalToolkit;

impl LexicalToolkit {
    fn components(template: &str) -> Result<(Vec<String>, Vec<String>), RetroMineError> {
        let trimmed = template.trim();
        let mut sides = trimmed.split(SIDE_SEPARATOR);
        let (Some(left), Some(right), None) = (sides.next(), sides.next(), sides.next()) else {
            return Err(RetroMineError::Toolkit(format!(
                "template '{trimmed}' must contain exactly one '{SIDE_SEPARATOR}'"
            )));
        };
        Ok((Self::side(left, trimmed)?, Self::side(right, trimmed)?))
    }

    fn side(side: &str, template: &str) -> Result<Vec<String>, RetroMineError> {
        let mut components = side
            .split(COMPONENT_SEPARATOR)
            .map(|component| {
                if component.is_empty() {
                    return Err(RetroMineError::Toolkit(format!(
                        "template '{template}' has an empty component"
                    )));
                }
                strip_atom_maps(component)
            })
            .collect::<Result<Vec<_>, _>>()?;
        components.sort_unstable();
        Ok(components)
    }
}

/// Removes `:<digits>` map labels from bracket atoms.
fn strip_atom_maps(component: &str) -> Result<String, RetroMineError> {
    let mut output = String::with_capacity(component.len());
    let mut bracket: Option<String> = None;

    let unbalanced =
        || RetroMineError::Toolkit(format!("unbalanced brackets in '{component}'"));

    for c in component.chars() {
        match c {
            '[' => {
                if bracket.is_some() {
                    return Err(unbalanced());
                }
                bracket = Some(String::new());
            }
            ']' => {
                let mut atom = bracket.take().ok_or_else(unbalanced)?;
                if let Some(colon) = atom.rfind(':') {
                    let label = &atom[colon + 1..];
                    if !label.is_empty() && label.chars().all(|d| d.is_ascii_digit()) {
                        atom.truncate(colon);
                    }
                }
                output.push('[');
                output.push_str(&atom);
                output.push(']');
            }
            c => match bracket.as_mut() {
                Some(atom) => atom.push(c),
                None => output.push(c),
            },
        }
    }

    if bracket.is_some() {
        return Err(unbalanced());
    }
    Ok(output)
}

fn multiset(left: &[String], right: &[String]) -> BTreeMap<(u8, String), usize> {
    let mut counts = BTreeMap::new();
    for component in left {
        *counts.entry((0, component.clone())).or_insert(0) += 1;
    }
    for component in right {
        *counts.entry((1, component.clone())).or_insert(0) += 1;
    }
    counts
}

impl ChemistryToolkit for LexicalToolkit {
    fn canonicalize(&self, template: &str) -> Result<String, RetroMineError> {
        let (left, right) = Self::components(template)?;
        Ok(format!(
            "{}{SIDE_SEPARATOR}{}",
            left.join("."),
            right.join(".")
        ))
    }

    fn apply(&self, template: &str, _structure: &str) -> Result<Vec<Vec<String>>, RetroMineError> {
        Err(RetroMineError::TemplateApplication(format!(
            "lexical toolkit cannot apply '{template}': no substructure matcher"
        )))
    }

    fn similarity(&self, a: &str, b: &str) -> Result<f64, RetroMineError> {
        let (a_left, a_right) = Self::components(a)?;
        let (b_left, b_right) = Self::components(b)?;
        if a_left == b_left && a_right == b_right {
            return Ok(EXACT_SIMILARITY);
        }

        let a_counts = multiset(&a_left, &a_right);
        let b_counts = multiset(&b_left, &b_right);
        let mut shared = 0usize;
        let mut union = 0usize;
        for (key, &a_count) in &a_counts {
            let b_count = b_counts.get(key).copied().unwrap_or(0);
            shared += a_count.min(b_count);
            union += a_count.max(b_count);
        }
        union += b_counts
            .iter()
            .filter(|(key, _)| !a_counts.contains_key(*key))
            .map(|(_, &count)| count)
            .sum::<usize>();

        Ok(shared as f64 / union as f64)
    }
}
