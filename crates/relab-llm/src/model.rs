//! The `LanguageModel` capability trait
//!
//! One production implementation talks to a real model endpoint; tests use
//! the scripted fake from `relab-test-utils`. The trait is deliberately
//! narrow: a named template plus a fully rendered prompt in, free text out.

use crate::error::LmError;
use serde::{Deserialize, Serialize};

/// Which fixed prompt template a request uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromptKind {
    /// Per-chunk paper decomposition extraction
    Decompose,
    /// Notebook cell generation from an experiment description
    GenerateNotebook,
    /// Repair of a failing cell
    FixNotebook,
}

impl PromptKind {
    /// Stable template name (used in trajectory records)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PromptKind::Decompose => "decompose",
            PromptKind::GenerateNotebook => "generate_notebook",
            PromptKind::FixNotebook => "fix_notebook",
        }
    }
}

impl std::fmt::Display for PromptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single request to the language-model collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmRequest {
    /// Template this prompt was rendered from
    pub kind: PromptKind,
    /// Fully rendered prompt text
    pub prompt: String,
}

impl LmRequest {
    /// Create a new request
    #[inline]
    #[must_use]
    pub fn new(kind: PromptKind, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
        }
    }
}

/// Synchronous (from the caller's viewpoint) request/response capability
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one prompt and wait for the complete free-text response
    ///
    /// # Errors
    /// - `LmError::Unreachable` / `LmError::RequestFailed` on transport or
    ///   endpoint failures
    /// - `LmError::Timeout` when the call exceeds its own deadline
    async fn complete(&self, request: LmRequest) -> Result<String, LmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_kind_names() {
        assert_eq!(PromptKind::Decompose.name(), "decompose");
        assert_eq!(PromptKind::FixNotebook.to_string(), "fix_notebook");
    }

    #[test]
    fn request_construction() {
        let req = LmRequest::new(PromptKind::GenerateNotebook, "prompt text");
        assert_eq!(req.kind, PromptKind::GenerateNotebook);
        assert_eq!(req.prompt, "prompt text");
    }
}
