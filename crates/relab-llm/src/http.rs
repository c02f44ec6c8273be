//! HTTP-backed language model client
//!
//! Talks to a chat backend exposing `POST {base}/chat` with a JSON body
//! `{"history": [], "message": "<prompt>"}` and a `{"text": "<reply>"}`
//! response. Each RELAB prompt is self-contained, so no history is sent.

use crate::error::LmError;
use crate::model::{LanguageModel, LmRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-request deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    history: Vec<serde_json::Value>,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    text: String,
}

/// Production `LanguageModel` over an HTTP chat backend
#[derive(Debug, Clone)]
pub struct HttpLanguageModel {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpLanguageModel {
    /// Client for the backend at `base_url` (e.g. `http://localhost:8000`)
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat", base_url.trim_end_matches('/')),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request deadline
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint requests are sent to
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn complete(&self, request: LmRequest) -> Result<String, LmError> {
        tracing::debug!(
            kind = %request.kind,
            prompt_chars = request.prompt.len(),
            "sending prompt"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&ChatRequest {
                history: Vec::new(),
                message: &request.prompt,
            })
            .send()
            .await
            .map_err(|e| classify_transport(&e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LmError::RequestFailed(format!(
                "{status} from {}",
                self.endpoint
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LmError::RequestFailed(format!("invalid chat response: {e}")))?;
        tracing::debug!(reply_chars = body.text.len(), "received response");
        Ok(body.text)
    }
}

fn classify_transport(error: &reqwest::Error, timeout: Duration) -> LmError {
    if error.is_timeout() {
        LmError::Timeout {
            duration_secs: timeout.as_secs(),
        }
    } else if error.is_connect() {
        LmError::Unreachable(error.to_string())
    } else {
        LmError::RequestFailed(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalizes_trailing_slash() {
        assert_eq!(
            HttpLanguageModel::new("http://localhost:8000/").endpoint(),
            "http://localhost:8000/chat"
        );
        assert_eq!(
            HttpLanguageModel::new("http://localhost:8000").endpoint(),
            "http://localhost:8000/chat"
        );
    }

    #[test]
    fn chat_request_shape() {
        let body = ChatRequest {
            history: Vec::new(),
            message: "prompt text",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["history"], serde_json::json!([]));
        assert_eq!(value["message"], "prompt text");
    }
}
