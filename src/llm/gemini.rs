use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{LlmError, TextModel};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Knobs for the model call itself.
///
/// Retries default to zero; an unbounded, retry-free network call is a known
/// risk, so both limits are explicit configuration rather than implicit.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 0,
        }
    }
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, options: &GenerationOptions) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            model,
            retries: options.retries,
        })
    }

    /// Build a client from `GEMINI_API_KEY`.
    pub fn from_env(model: String, options: &GenerationOptions) -> Result<Self, LlmError> {
        let api_key = env::var("GEMINI_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
        Self::new(api_key, model, options)
    }

    /// Request URL for the configured model. The API key travels in the
    /// `x-goog-api-key` header, never in the URL, so surfaced transport
    /// errors and URL logs cannot leak the credential.
    fn request_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    async fn request_once(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.request_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| String::new());
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await?;

        body.candidates
            .and_then(|mut candidates| candidates.drain(..).next())
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts)
            .and_then(|mut parts| parts.drain(..).next())
            .and_then(|part| part.text)
            .ok_or(LlmError::NoText)
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            match self.request_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    log::warn!(
                        "model call failed (attempt {}/{}): {}",
                        attempt,
                        self.retries + 1,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape_matches_generate_content_api() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hello" }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn response_text_is_extracted() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"SELECT 1;"}]}}]}"#,
        )
        .unwrap();
        let text = body
            .candidates
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|mut p| p.drain(..).next())
            .and_then(|p| p.text);
        assert_eq!(text.as_deref(), Some("SELECT 1;"));
    }

    #[test]
    fn empty_candidates_mean_no_text() {
        let body: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(body.candidates.unwrap().is_empty());
    }

    #[test]
    fn request_url_never_contains_the_api_key() {
        let client = GeminiClient::new(
            "super-secret-key".to_string(),
            "gemini-2.0-flash".to_string(),
            &GenerationOptions::default(),
        )
        .unwrap();

        let url = client.request_url();
        assert!(!url.contains("super-secret-key"));
        assert!(!url.contains("key="));
        assert!(url.ends_with("/models/gemini-2.0-flash:generateContent"));
    }

    #[test]
    fn missing_api_key_is_an_error() {
        std::env::remove_var("GEMINI_API_KEY");
        let result = GeminiClient::from_env(
            "gemini-2.0-flash".to_string(),
            &GenerationOptions::default(),
        );
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }
}
