//! Deterministic merge of per-chunk partial decompositions
//!
//! Pure function over ordered lists with explicit tie-break rules:
//! - title/authors/abstract: first chunk supplying a non-empty value wins
//! - sections/experiments: concatenated in chunk order, deduplicated by id,
//!   first occurrence wins (no field-level reconciliation); entries with an
//!   empty id cannot participate in identity-based dedup and are dropped
//! - reproducibility assessment: LAST chunk supplying one wins (later chunks
//!   reflect fuller context)

use crate::types::{PaperDecomposition, PartialDecomposition};
use std::collections::HashSet;

/// Merge ordered per-chunk payloads into one decomposition
#[must_use]
pub fn merge(partials: &[PartialDecomposition]) -> PaperDecomposition {
    let mut merged = PaperDecomposition::default();

    for partial in partials {
        if merged.title.is_empty() {
            if let Some(title) = partial.title.as_deref() {
                if !title.is_empty() {
                    merged.title = title.to_string();
                }
            }
        }
        if merged.authors.is_empty() && !partial.authors.is_empty() {
            merged.authors = partial.authors.clone();
        }
        if merged.abstract_text.is_empty() {
            if let Some(text) = partial.abstract_text.as_deref() {
                if !text.is_empty() {
                    merged.abstract_text = text.to_string();
                }
            }
        }
    }

    let mut seen_sections = HashSet::new();
    let mut seen_experiments = HashSet::new();
    for partial in partials {
        for section in &partial.sections {
            if !section.id.is_empty() && seen_sections.insert(section.id.clone()) {
                merged.sections.push(section.clone());
            }
        }
        for experiment in &partial.experiments {
            if !experiment.id.is_empty() && seen_experiments.insert(experiment.id.clone()) {
                merged.experiments.push(experiment.clone());
            }
        }
    }

    if let Some(assessment) = partials.iter().rev().find_map(|p| p.reproducibility.as_ref()) {
        merged.reproducibility = assessment.clone();
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Assessment, Difficulty, ExperimentDescription, Section};
    use pretty_assertions::assert_eq;

    fn experiment(id: &str, title: &str) -> ExperimentDescription {
        ExperimentDescription {
            id: id.to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn title_first_nonempty_wins() {
        let partials = vec![
            PartialDecomposition {
                title: Some(String::new()),
                ..Default::default()
            },
            PartialDecomposition {
                title: Some("From Chunk Two".to_string()),
                ..Default::default()
            },
            PartialDecomposition {
                title: Some("From Chunk Three".to_string()),
                ..Default::default()
            },
        ];
        assert_eq!(merge(&partials).title, "From Chunk Two");
    }

    #[test]
    fn duplicate_experiments_first_occurrence_wins() {
        // Scenario A: chunk 1 has [e1, e2], chunk 2 has [e2', e3]
        let partials = vec![
            PartialDecomposition {
                experiments: vec![experiment("e1", "First"), experiment("e2", "Original")],
                ..Default::default()
            },
            PartialDecomposition {
                experiments: vec![experiment("e2", "Conflicting"), experiment("e3", "Third")],
                ..Default::default()
            },
        ];
        let merged = merge(&partials);
        let ids: Vec<_> = merged.experiments.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2", "e3"]);
        assert_eq!(merged.experiments[1].title, "Original");
    }

    #[test]
    fn sections_deduplicate_in_order() {
        let section = |id: &str| Section {
            id: id.to_string(),
            ..Default::default()
        };
        let partials = vec![
            PartialDecomposition {
                sections: vec![section("1"), section("2")],
                ..Default::default()
            },
            PartialDecomposition {
                sections: vec![section("2"), section("3"), section("")],
                ..Default::default()
            },
        ];
        let ids: Vec<_> = merge(&partials).sections.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn assessment_last_supplier_wins() {
        let partials = vec![
            PartialDecomposition {
                reproducibility: Some(Assessment {
                    difficulty: Difficulty::High,
                    estimated_effort_hours: 40.0,
                    notes: "early guess".to_string(),
                }),
                ..Default::default()
            },
            PartialDecomposition::default(),
            PartialDecomposition {
                reproducibility: Some(Assessment {
                    difficulty: Difficulty::Low,
                    estimated_effort_hours: 4.0,
                    notes: "full context".to_string(),
                }),
                ..Default::default()
            },
        ];
        let merged = merge(&partials);
        assert_eq!(merged.reproducibility.difficulty, Difficulty::Low);
        assert_eq!(merged.reproducibility.notes, "full context");
    }

    #[test]
    fn single_chunk_merge_is_identity() {
        let partial = PartialDecomposition {
            title: Some("Solo".to_string()),
            authors: vec!["A. Author".to_string()],
            abstract_text: Some("One chunk.".to_string()),
            sections: vec![Section {
                id: "1".to_string(),
                heading: "Intro".to_string(),
                summary: "Opening".to_string(),
            }],
            experiments: vec![experiment("e1", "Only")],
            reproducibility: Some(Assessment::default()),
        };
        let merged = merge(std::slice::from_ref(&partial));

        assert_eq!(merged.title, "Solo");
        assert_eq!(merged.authors, partial.authors);
        assert_eq!(merged.abstract_text, "One chunk.");
        assert_eq!(merged.sections, partial.sections);
        assert_eq!(merged.experiments, partial.experiments);
        assert_eq!(merged.reproducibility, Assessment::default());
    }

    #[test]
    fn empty_input_yields_default() {
        assert_eq!(merge(&[]), PaperDecomposition::default());
    }
}
