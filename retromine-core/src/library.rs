use std::collections::HashSet;

/// Reference template library, stored as canonical template strings.
///
/// Membership is an exact string match, so entries must already be in the
/// same canonical form the active toolkit produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateLibrary {
    templates: HashSet<String>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, canonical: impl Into<String>) -> bool {
        self.templates.insert(canonical.into())
    }

    #[must_use]
    pub fn contains(&self, canonical: &str) -> bool {
        self.templates.contains(canonical)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TemplateLibrary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            templates: iter.into_iter().map(Into::into).collect(),
        }
    }
}
