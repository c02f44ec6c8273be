//! Error types for the language-model boundary

/// Errors from a language-model request
#[derive(Debug, thiserror::Error)]
pub enum LmError {
    /// The collaborator endpoint could not be reached
    #[error("language model unreachable: {0}")]
    Unreachable(String),

    /// The request timed out
    #[error("language model request timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// The collaborator returned an explicit failure
    #[error("language model request failed: {0}")]
    RequestFailed(String),

    /// The scripted fake ran out of responses (test-only condition)
    #[error("no scripted response available")]
    Exhausted,
}

/// Errors extracting a JSON value from a free-text response
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    /// No JSON-like region found anywhere in the text
    #[error("no JSON value found in response")]
    NoJson,

    /// A candidate region was found but did not parse
    #[error("malformed JSON in response: {0}")]
    Syntax(#[from] serde_json::Error),
}
