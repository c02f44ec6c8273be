//! Per-chunk extraction against the language-model collaborator
//!
//! Each chunk gets the fixed extraction prompt. A malformed response is
//! retried against the same chunk with a JSON-only reminder, up to the retry
//! budget; a chunk that never parses contributes no data. Transport failures
//! are not retried here and propagate unchanged.

use crate::error::DecomposeError;
use crate::merge::merge;
use crate::types::{PaperDecomposition, PartialDecomposition};
use crate::validate::validate;
use relab_llm::{prompts, LanguageModel};
use std::sync::Arc;

/// Default extra attempts per chunk after a malformed response
pub const DEFAULT_RETRY_BUDGET: usize = 2;

/// Extracts and merges a decomposition from ordered text chunks
pub struct DecompositionExtractor {
    lm: Arc<dyn LanguageModel>,
    retry_budget: usize,
}

impl DecompositionExtractor {
    /// Create an extractor with the default retry budget
    #[must_use]
    pub fn new(lm: Arc<dyn LanguageModel>) -> Self {
        Self {
            lm,
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }

    /// Override the per-chunk retry budget
    #[inline]
    #[must_use]
    pub fn with_retry_budget(mut self, budget: usize) -> Self {
        self.retry_budget = budget;
        self
    }

    /// Extract, merge, and validate a decomposition from `chunks`
    ///
    /// # Errors
    /// - `DecomposeError::NoData` when every chunk fails to parse
    /// - `DecomposeError::Lm` on collaborator transport failure (not retried)
    /// - `DecomposeError::Schema` when the merged result violates the schema;
    ///   the partial result rides along for the caller to inspect
    pub async fn extract(&self, chunks: &[String]) -> Result<PaperDecomposition, DecomposeError> {
        let mut partials = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            tracing::debug!(chunk = i + 1, total = chunks.len(), "extracting chunk");
            match self.extract_chunk(chunk).await? {
                Some(partial) => partials.push(partial),
                None => {
                    tracing::warn!(
                        chunk = i + 1,
                        budget = self.retry_budget,
                        "chunk skipped after exhausting retry budget"
                    );
                }
            }
        }

        if partials.is_empty() {
            return Err(DecomposeError::NoData);
        }

        let merged = merge(&partials);
        tracing::info!(
            experiments = merged.experiments.len(),
            sections = merged.sections.len(),
            "merged decomposition"
        );

        match validate(&merged) {
            Ok(()) => Ok(merged),
            Err(source) => Err(DecomposeError::Schema {
                source,
                partial: Box::new(merged),
            }),
        }
    }

    /// One chunk: initial attempt plus up to `retry_budget` reprompts
    async fn extract_chunk(
        &self,
        chunk: &str,
    ) -> Result<Option<PartialDecomposition>, DecomposeError> {
        let mut request = prompts::decompose_prompt(chunk);

        for attempt in 0..=self.retry_budget {
            let response = self.lm.complete(request.clone()).await?;

            match parse_partial(&response) {
                Ok(partial) => return Ok(Some(partial)),
                Err(reason) => {
                    tracing::debug!(attempt = attempt + 1, %reason, "malformed chunk response");
                    request = prompts::decompose_reprompt(chunk, &reason);
                }
            }
        }

        Ok(None)
    }
}

/// Parse one response into a partial payload; the error is the reprompt hint
fn parse_partial(response: &str) -> Result<PartialDecomposition, String> {
    let value = relab_llm::extract_first_json(response).map_err(|e| e.to_string())?;
    serde_json::from_value(value).map_err(|e| e.to_string())
}
