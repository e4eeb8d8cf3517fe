//! Gemini `generateContent` client

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::request::RequestType;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeminiConfig {
    /// Base URL up to and including `/models`
    pub endpoint: String,
    pub model: String,
    pub generation: GenerationConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            generation: GenerationConfig::default(),
        }
    }
}

impl GeminiConfig {
    pub fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model)
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest<'a> {
    pub contents: Vec<Content>,
    pub generation_config: &'a GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`
    pub fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn build_request(&self, text: &str, request_type: &RequestType) -> GenerateRequest<'_> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: request_type.prompt(text),
                }],
            }],
            generation_config: &self.config.generation,
        }
    }

    /// Run one transformation. A missing or blank key fails before any
    /// network traffic. No retries.
    pub async fn translate(&self, text: &str, request_type: &RequestType, api_key: Option<&str>) -> Result<String, ServiceError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ServiceError::MissingApiKey)?;

        let body = self.build_request(text, request_type);
        log::debug!("service: {request_type} request, {} chars", text.len());

        let response = self
            .http
            .post(self.config.url())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("service: {request_type} failed with {status}");
            return Err(ServiceError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            log::warn!("service: undecodable response: {e}");
            ServiceError::MalformedResponse
        })?;
        parsed.into_text().ok_or(ServiceError::MalformedResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response; resolves to the raw request text.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/v1beta/models", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0);
                    if raw.len() >= split + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let reply = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });

        (endpoint, handle)
    }

    fn client(endpoint: String) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            endpoint,
            ..GeminiConfig::default()
        })
    }

    #[test]
    fn test_request_body_shape() {
        let client = GeminiClient::default();
        let body = serde_json::to_value(client.build_request("hi", &RequestType::Eli5)).unwrap();
        assert!(body["contents"][0]["parts"][0]["text"].as_str().unwrap().ends_with("\n\nhi"));
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(
            client.config().url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn test_response_text_extraction() {
        let ok: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"done"}]}}]}"#).unwrap();
        assert_eq!(ok.into_text().as_deref(), Some("done"));

        for raw in [r#"{}"#, r#"{"candidates":[]}"#, r#"{"candidates":[{}]}"#, r#"{"candidates":[{"content":{"parts":[]}}]}"#] {
            let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed.into_text(), None, "{raw}");
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let client = client("http://127.0.0.1:9/unreachable".into());
        for key in [None, Some(""), Some("   ")] {
            let err = client.translate("text", &RequestType::Tldr, key).await.unwrap_err();
            assert!(matches!(err, ServiceError::MissingApiKey));
        }
    }

    #[tokio::test]
    async fn test_success() {
        let (endpoint, server) =
            serve_once("200 OK", r#"{"candidates":[{"content":{"parts":[{"text":"Summary."}]}}]}"#).await;
        let out = client(endpoint).translate("body", &RequestType::Tldr, Some("k-123")).await.unwrap();
        assert_eq!(out, "Summary.");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/gemini-2.0-flash-exp:generateContent?key=k-123 "));
        assert!(request.contains("\"temperature\":0.7"));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let (endpoint, server) = serve_once("403 Forbidden", "{}").await;
        let err = client(endpoint).translate("body", &RequestType::Translate, Some("k")).await.unwrap_err();
        assert_eq!(err.to_string(), "API request failed: 403 Forbidden");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (endpoint, server) = serve_once("200 OK", r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).await;
        let err = client(endpoint).translate("body", &RequestType::Format, Some("k")).await.unwrap_err();
        assert!(matches!(err, ServiceError::MalformedResponse));
        server.await.unwrap();
    }
}
