//! Schema validation over a merged decomposition
//!
//! Collects every violation into one `SchemaError` instead of failing on the
//! first, so a caller deciding whether to accept a partially valid result
//! sees the full picture.

use crate::error::SchemaError;
use crate::types::PaperDecomposition;
use std::collections::HashSet;

/// Validate the invariants of a merged decomposition
///
/// Invariants: non-empty title; every experiment has a non-empty id and
/// title; experiment ids are unique within the list. An empty experiments
/// list is valid.
///
/// # Errors
/// `SchemaError` listing every violated field.
pub fn validate(decomposition: &PaperDecomposition) -> Result<(), SchemaError> {
    let mut violations = Vec::new();

    if decomposition.title.is_empty() {
        violations.push("title: must be non-empty".to_string());
    }

    let mut seen = HashSet::new();
    for (i, experiment) in decomposition.experiments.iter().enumerate() {
        if experiment.id.is_empty() {
            violations.push(format!("experiments[{i}].id: must be non-empty"));
        } else if !seen.insert(experiment.id.as_str()) {
            violations.push(format!(
                "experiments[{i}].id: duplicate identifier '{}'",
                experiment.id
            ));
        }
        if experiment.title.is_empty() {
            violations.push(format!("experiments[{i}].title: must be non-empty"));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError { violations })
    }
}
