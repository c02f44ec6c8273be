//! Decomposition data model
//!
//! `PartialDecomposition` is the untrusted per-chunk shape (everything
//! optional, everything defaulted); `PaperDecomposition` is the merged
//! result the rest of the pipeline consumes. An `ExperimentDescription` is
//! immutable once merged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dataset used by an experiment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetDescriptor {
    /// Dataset name (e.g. "CIFAR-10")
    pub name: String,
    /// Where the data comes from (URL, registry, "generated")
    pub source: String,
    /// Free-text size description ("60k images", "1.2 GB")
    pub size: String,
    /// True when the paper itself uses synthetic data
    pub synthetic: bool,
}

/// Model used by an experiment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDescriptor {
    /// Model family ("cnn", "transformer", "linear")
    pub kind: String,
    /// Architecture detail ("ResNet-18", "2-layer MLP")
    pub architecture: String,
    /// Framework named by the paper ("pytorch", "sklearn")
    pub framework: String,
}

/// A hyperparameter value: string or number, with an open-ended escape hatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HyperValue {
    /// Integer value
    Int(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    Text(String),
    /// Anything else the collaborator supplied (the "other" bag)
    Other(Value),
}

/// One experiment extracted from the paper
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentDescription {
    /// Identifier, unique within a decomposition
    pub id: String,
    /// Experiment title
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Dataset descriptor
    pub dataset: DatasetDescriptor,
    /// Input shape description
    pub input_shape: String,
    /// Output shape description
    pub output_shape: String,
    /// Model descriptor
    pub model: ModelDescriptor,
    /// Hyperparameters in first-mentioned order
    pub hyperparameters: IndexMap<String, HyperValue>,
    /// Metric names the paper reports
    pub metrics: Vec<String>,
    /// Referenced figure/table identifiers
    pub figures: Vec<String>,
}

/// One document section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    /// Section identifier ("3.1")
    pub id: String,
    /// Section heading
    pub heading: String,
    /// One-paragraph summary
    pub summary: String,
}

/// Reproduction difficulty estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Straightforward to reproduce
    Low,
    /// Some missing details or moderate compute
    #[default]
    Medium,
    /// Major gaps or heavy compute
    High,
}

/// Reproducibility assessment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Assessment {
    /// Overall difficulty
    pub difficulty: Difficulty,
    /// Estimated effort in hours
    pub estimated_effort_hours: f64,
    /// Free-text notes
    pub notes: String,
}

/// Untrusted per-chunk payload: every field optional or defaulted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialDecomposition {
    /// Paper title, if this chunk saw it
    pub title: Option<String>,
    /// Author list, if this chunk saw it
    pub authors: Vec<String>,
    /// Abstract, if this chunk saw it
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Sections mentioned in this chunk
    pub sections: Vec<Section>,
    /// Experiments mentioned in this chunk
    pub experiments: Vec<ExperimentDescription>,
    /// Assessment, if this chunk supplied one
    pub reproducibility: Option<Assessment>,
}

/// The merged, validated decomposition of one paper
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperDecomposition {
    /// Paper title
    pub title: String,
    /// Author list
    pub authors: Vec<String>,
    /// Abstract
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Sections in document order
    pub sections: Vec<Section>,
    /// Experiments in first-seen order
    pub experiments: Vec<ExperimentDescription>,
    /// Reproducibility assessment
    pub reproducibility: Assessment,
}
