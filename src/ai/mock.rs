use super::{ContentPart, GenerationConfig, GenerationService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A provider invocation captured by [`MockGenerationClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub parts: Vec<ContentPart>,
    pub config: GenerationConfig,
}

enum MockResponse {
    Text(String),
    Failure(String),
}

pub struct MockGenerationClient {
    responses: Arc<Mutex<Vec<MockResponse>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_text_response(self, response: String) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockResponse::Text(response));
        self
    }

    pub fn with_failure(self, message: String) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(MockResponse::Failure(message));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate_content(
        &self,
        parts: &[ContentPart],
        config: &GenerationConfig,
    ) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(RecordedCall {
            parts: parts.to_vec(),
            config: config.clone(),
        });

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Default mock response echoes the prompt
            let prompt = parts
                .iter()
                .find_map(|p| match p {
                    ContentPart::Text(text) => Some(text.as_str()),
                    ContentPart::InlineBinary { .. } => None,
                })
                .unwrap_or_default();
            return Ok(format!("Echo: {}", prompt));
        }

        let index = (calls.len() - 1) % responses.len();
        match &responses[index] {
            MockResponse::Text(text) => Ok(text.clone()),
            MockResponse::Failure(message) => Err(Error::AiProvider(message.clone())),
        }
    }
}
