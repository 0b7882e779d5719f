//! Request adaptation pipeline
//!
//! Every endpoint funnels through the same steps: validate the inbound
//! fields, build the content parts, call the provider once and wrap the
//! text. The input kind decides which upload is required and which persona,
//! if any, is attached.

use crate::ai::{ContentPart, GenerationConfig, GenerationService};
use crate::models::{ChatTurn, GenerationResult};
use crate::{prompts, Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Shape of an inbound generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Image,
    Document,
    Audio,
}

impl InputKind {
    /// Multipart field carrying the upload, `None` for text-only requests.
    pub fn file_field(self) -> Option<&'static str> {
        match self {
            InputKind::Text => None,
            InputKind::Image => Some("image"),
            InputKind::Document => Some("document"),
            InputKind::Audio => Some("audio"),
        }
    }

    /// Fixed system instruction for this kind.
    pub fn persona(self) -> Option<&'static str> {
        match self {
            InputKind::Document => Some(prompts::DOCUMENT_PERSONA),
            InputKind::Text | InputKind::Image | InputKind::Audio => None,
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputKind::Text => "text",
            InputKind::Image => "image",
            InputKind::Document => "document",
            InputKind::Audio => "audio",
        };
        f.write_str(name)
    }
}

/// An uploaded file, with the MIME type to forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// A validated request, ready to be adapted into provider content parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub attachment: Option<Attachment>,
    pub system_instruction: Option<String>,
}

impl GenerationRequest {
    /// Validate raw inbound fields for `kind`.
    ///
    /// The prompt must be present and non-blank. Attachment kinds require
    /// exactly one non-empty upload; text requests never carry one.
    pub fn for_kind(
        kind: InputKind,
        prompt: Option<String>,
        attachment: Option<Attachment>,
    ) -> Result<Self> {
        let prompt = require_text(prompt, "'prompt'")?;

        let attachment = match (kind.file_field(), attachment) {
            (None, None) => None,
            (None, Some(_)) => {
                return Err(Error::InvalidInput(
                    "text generation does not accept an attachment".to_string(),
                ))
            }
            (Some(field), None) => {
                return Err(Error::InvalidInput(format!("'{}' file is required", field)))
            }
            (Some(field), Some(attachment)) if attachment.bytes.is_empty() => {
                return Err(Error::InvalidInput(format!("'{}' file is empty", field)))
            }
            (Some(_), Some(attachment)) => Some(attachment),
        };

        Ok(Self {
            prompt,
            attachment,
            system_instruction: kind.persona().map(str::to_string),
        })
    }

    /// Prompt text first, then at most one inline binary.
    pub fn into_parts(self) -> (Vec<ContentPart>, GenerationConfig) {
        let mut parts = vec![ContentPart::Text(self.prompt)];
        if let Some(attachment) = self.attachment {
            parts.push(ContentPart::InlineBinary {
                data: attachment.bytes,
                mime_type: attachment.mime_type,
            });
        }

        let config = GenerationConfig {
            system_instruction: self.system_instruction,
        };
        (parts, config)
    }
}

fn require_text(text: Option<String>, what: &str) -> Result<String> {
    text.filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("{} is required", what)))
}

/// Immutable per-process handle shared by every request.
pub struct Gateway {
    service: Arc<dyn GenerationService>,
}

impl Gateway {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }

    /// Validate, adapt and forward one generation request.
    pub async fn generate(
        &self,
        kind: InputKind,
        prompt: Option<String>,
        attachment: Option<Attachment>,
    ) -> Result<GenerationResult> {
        let request = GenerationRequest::for_kind(kind, prompt, attachment)?;

        match &request.attachment {
            Some(attachment) => info!(
                "Generating from {} ({}, {} bytes)",
                kind,
                attachment.mime_type,
                attachment.bytes.len()
            ),
            None => info!("Generating from {}", kind),
        }

        self.dispatch(request).await
    }

    /// Answer the last turn of `conversation` as the trade advisor persona.
    ///
    /// Earlier turns are ignored.
    pub async fn chat(&self, conversation: Option<Vec<ChatTurn>>) -> Result<GenerationResult> {
        let last = conversation
            .and_then(|turns| turns.into_iter().last())
            .ok_or_else(|| {
                Error::InvalidInput("'conversation' must be a non-empty array".to_string())
            })?;

        let prompt = require_text(Some(last.content), "last conversation turn 'content'")?;

        info!("Chat request (last turn role: {})", last.role);

        self.dispatch(GenerationRequest {
            prompt,
            attachment: None,
            system_instruction: Some(prompts::TRADE_ADVISOR.to_string()),
        })
        .await
    }

    async fn dispatch(&self, request: GenerationRequest) -> Result<GenerationResult> {
        let (parts, config) = request.into_parts();
        let text = self.service.generate_content(&parts, &config).await?;
        Ok(GenerationResult::new(text))
    }
}
