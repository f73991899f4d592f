use std::collections::HashSet;

use crate::analysis::TemplateUsageAnalyser;
use crate::chemistry::canonicalize_all;
use crate::library::TemplateLibrary;
use crate::results::ScoreTable;

/// Unused templates split by reference-library membership.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSplit {
    /// Templates the library already has but the search failed to use
    pub overlooked: ScoreTable,
    /// Templates the library lacks
    pub novel: ScoreTable,
}

impl TemplateUsageAnalyser {
    /// Splits unused templates into overlooked and novel ones.
    ///
    /// A template is overlooked when its canonical form is in `library`.
    /// Scores and ranking carry over unchanged.
    #[must_use]
    pub fn split_unused(&self, unused: &ScoreTable, library: &TemplateLibrary) -> TemplateSplit {
        let templates: Vec<&str> = unused.templates().collect();
        let canonical = canonicalize_all(self.toolkit.as_ref(), &templates);
        let in_library: HashSet<&str> = templates
            .iter()
            .zip(&canonical)
            .filter(|(_, canonical)| library.contains(canonical))
            .map(|(template, _)| *template)
            .collect();

        log::info!(
            "{} of {} unused templates are in the reference library",
            in_library.len(),
            templates.len()
        );
        TemplateSplit {
            overlooked: unused.filtered(|template, _| in_library.contains(template)),
            novel: unused.filtered(|template, _| !in_library.contains(template)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::AnalysisConfig;
    use crate::scoring::CostMaterials;
    use crate::test_support::MockToolkit;

    fn analyser(toolkit: MockToolkit) -> TemplateUsageAnalyser {
        TemplateUsageAnalyser::new(
            &AnalysisConfig::default(),
            Arc::new(toolkit),
            CostMaterials::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_split_by_library_membership() {
        let analyser = analyser(MockToolkit::new());
        let unused = ScoreTable::from_scores([("tX", 0.8), ("tY", 0.3)]);
        let library: TemplateLibrary = ["canon(tX)", "canon(tZ)"].into_iter().collect();

        let split = analyser.split_unused(&unused, &library);
        assert_eq!(split.overlooked, ScoreTable::from_scores([("tX", 0.8)]));
        assert_eq!(split.novel, ScoreTable::from_scores([("tY", 0.3)]));
    }

    #[test]
    fn test_split_is_a_partition() {
        let analyser = analyser(MockToolkit::new().unparsable("raw"));
        let unused = ScoreTable::from_scores([("a", 0.9), ("raw", 0.5), ("b", 0.4), ("c", 0.1)]);
        let library: TemplateLibrary = ["canon(b)", "raw"].into_iter().collect();

        let split = analyser.split_unused(&unused, &library);
        assert_eq!(split.overlooked.templates().collect::<Vec<_>>(), vec!["raw", "b"]);
        assert_eq!(split.novel.templates().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(split.overlooked.len() + split.novel.len(), unused.len());
    }

    #[test]
    fn test_empty_library_makes_everything_novel() {
        let analyser = analyser(MockToolkit::new());
        let unused = ScoreTable::from_scores([("a", 0.2)]);
        let split = analyser.split_unused(&unused, &TemplateLibrary::new());
        assert!(split.overlooked.is_empty());
        assert_eq!(split.novel, unused);
    }
}
