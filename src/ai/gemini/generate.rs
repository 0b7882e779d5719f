use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part};
use crate::ai::{ContentPart, GenerationConfig, GenerationService};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use std::time::Duration;

/// [`GenerationService`] backed by Gemini's `generateContent` REST endpoint.
pub struct GeminiClient {
    http: GeminiHttpClient,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    fn build_request(parts: &[ContentPart], config: &GenerationConfig) -> GenerateContentRequest {
        let parts = parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => Part::Text { text: text.clone() },
                ContentPart::InlineBinary { data, mime_type } => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.clone(),
                        data: base64::engine::general_purpose::STANDARD.encode(data),
                    },
                },
            })
            .collect();

        GenerateContentRequest {
            system_instruction: config.system_instruction.as_ref().map(|text| Content {
                role: None,
                parts: vec![Part::Text { text: text.clone() }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
        }
    }

    /// Concatenates every text part of the first candidate.
    fn extract_text(response: &GenerateContentResponse) -> Result<String> {
        let candidate = response.candidates.first().ok_or_else(|| {
            match response
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref())
            {
                Some(reason) => {
                    Error::AiProvider(format!("Gemini blocked the prompt: {}", reason))
                }
                None => Error::AiProvider("No candidates in Gemini response".to_string()),
            }
        })?;

        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } | Part::Other(_) => None,
            })
            .collect();

        if text.is_empty() {
            return Err(Error::AiProvider(format!(
                "No text in Gemini response (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn generate_content(
        &self,
        parts: &[ContentPart],
        config: &GenerationConfig,
    ) -> Result<String> {
        tracing::debug!(
            "Sending {} content part(s) to Gemini model {}",
            parts.len(),
            self.model()
        );

        let request = Self::build_request(parts, config);
        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        Self::extract_text(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-2.5-flash-lite";
    const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash-lite:generateContent";

    fn make_client(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key".to_string(), MODEL.to_string()).with_base_url(server.uri())
    }

    fn text_response(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
    }

    #[tokio::test]
    async fn test_text_only_request_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_json(serde_json::json!({
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": "What is the best movie ever made?" }]
                }]
            })))
            .respond_with(text_response("Probably Paddington 2."))
            .expect(1)
            .mount(&server)
            .await;

        let text = make_client(&server)
            .generate_content(
                &[ContentPart::Text(
                    "What is the best movie ever made?".to_string(),
                )],
                &GenerationConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(text, "Probably Paddington 2.");
    }

    #[tokio::test]
    async fn test_inline_binary_and_system_instruction_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(body_json(serde_json::json!({
                "systemInstruction": { "parts": [{ "text": "You are a cat." }] },
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "Summarize this" },
                        { "inlineData": { "mimeType": "application/pdf", "data": "AQID" } }
                    ]
                }]
            })))
            .respond_with(text_response("Meow Nyan~"))
            .expect(1)
            .mount(&server)
            .await;

        let parts = vec![
            ContentPart::Text("Summarize this".to_string()),
            ContentPart::InlineBinary {
                data: vec![1, 2, 3],
                mime_type: "application/pdf".to_string(),
            },
        ];
        let text = make_client(&server)
            .generate_content(
                &parts,
                &GenerationConfig::with_system_instruction("You are a cat."),
            )
            .await
            .unwrap();

        assert_eq!(text, "Meow Nyan~");
    }

    #[tokio::test]
    async fn test_concatenates_text_parts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "Hello, " }, { "text": "world" }] }
                }]
            })))
            .mount(&server)
            .await;

        let text = make_client(&server)
            .generate_content(&[], &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(text, "Hello, world");
    }

    #[tokio::test]
    async fn test_skips_unknown_part_shapes() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            { "thoughtSignature": "c2lnbmF0dXJl" },
                            { "functionCall": { "name": "lookup_tariff", "args": {} } },
                            { "text": "Tarif bea masuk 5%." }
                        ]
                    }
                }]
            })))
            .mount(&server)
            .await;

        let text = make_client(&server)
            .generate_content(&[], &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(text, "Tarif bea masuk 5%.");
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_content(&[], &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
        assert!(err.to_string().contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_rejects_empty_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_content(&[], &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_rejects_candidate_without_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "finishReason": "MAX_TOKENS" }]
            })))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_content(&[], &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .generate_content(&[], &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_strips_models_prefix_from_model_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(text_response("ok"))
            .expect(1)
            .mount(&server)
            .await;

        GeminiClient::new("test-key".to_string(), format!("models/{}", MODEL))
            .with_base_url(server.uri())
            .generate_content(&[], &GenerationConfig::default())
            .await
            .unwrap();
    }
}
