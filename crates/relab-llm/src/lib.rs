//! RELAB LLM - Language-model collaborator boundary
//!
//! Everything the rest of the workspace knows about the language model lives
//! here:
//! - The `LanguageModel` capability trait (one synchronous request/response
//!   call from the caller's viewpoint)
//! - The three fixed prompt templates and their builders
//! - An HTTP client implementation (`HttpLanguageModel`) for chat backends
//! - Tolerant extraction of the first JSON value from free-text responses
//!
//! Collaborator responses are untrusted free text. Callers must go through
//! `extract_first_json` and validate the result; nothing in this crate
//! assumes a response is well-formed.

pub mod error;
pub mod http;
pub mod model;
pub mod prompts;
pub mod response;

pub use error::{LmError, ResponseError};
pub use http::HttpLanguageModel;
pub use model::{LanguageModel, LmRequest, PromptKind};
pub use response::extract_first_json;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
