//! Generation provider integration
//!
//! Defines the provider-neutral content model and the [`GenerationService`]
//! seam. The Gemini REST client is the production implementation;
//! [`MockGenerationClient`] records calls for tests.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::GeminiClient;
pub use mock::{MockGenerationClient, RecordedCall};

use crate::Result;
use async_trait::async_trait;

/// One unit of provider input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineBinary { data: Vec<u8>, mime_type: String },
}

/// Per-call configuration sent alongside the content parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationConfig {
    pub system_instruction: Option<String>,
}

impl GenerationConfig {
    pub fn with_system_instruction(instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: Some(instruction.into()),
        }
    }
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Single-shot generation: returns the provider's text for `parts`.
    async fn generate_content(
        &self,
        parts: &[ContentPart],
        config: &GenerationConfig,
    ) -> Result<String>;
}
