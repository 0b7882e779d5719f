//! HTTP handlers
//!
//! Thin axum adapters: decode the inbound body, hand the fields to the
//! [`Gateway`] pipeline and map the outcome onto a JSON response.

use crate::ai::mime;
use crate::gateway::{Attachment, Gateway, InputKind};
use crate::models::{ChatRequest, ErrorBody, GenerationResult, PromptBody};
use crate::Error;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use std::sync::Arc;
use tracing::{error, warn};

pub type SharedGateway = Arc<Gateway>;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Error returned from every handler.
///
/// Client input problems keep their message; everything else is logged and
/// collapsed into a generic 500.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_client_error() {
            warn!("Rejected request: {}", self.0);
            let body = ErrorBody {
                error: self.0.to_string(),
            };
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }

        error!("Request failed: {}", self.0);
        let body = ErrorBody {
            error: INTERNAL_ERROR_MESSAGE.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<GenerationResult>, ApiError>;

/// Fields collected from a multipart upload.
#[derive(Debug, Default)]
struct UploadForm {
    prompt: Option<String>,
    attachment: Option<Attachment>,
}

/// Drain a multipart body, keeping `prompt` and the file named `file_field`.
///
/// Unknown fields are skipped; a repeated file field keeps the first upload.
async fn read_upload(
    mut multipart: Multipart,
    file_field: Option<&str>,
) -> crate::Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Attachment(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "prompt" {
            let text = field
                .text()
                .await
                .map_err(|e| Error::Attachment(e.body_text()))?;
            form.prompt = Some(text);
        } else if Some(name.as_str()) == file_field && form.attachment.is_none() {
            let declared = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::Attachment(e.body_text()))?;
            form.attachment = Some(Attachment {
                mime_type: mime::resolve_mime(declared.as_deref(), &bytes),
                bytes: bytes.to_vec(),
            });
        }
    }

    Ok(form)
}

/// `POST /generate-text`: prompt from a multipart form, URL-encoded form or JSON body.
pub async fn generate_text(State(gateway): State<SharedGateway>, request: Request) -> ApiResult {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let prompt = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &gateway)
            .await
            .map_err(|e| Error::Attachment(e.body_text()))?;
        read_upload(multipart, None).await?.prompt
    } else if content_type.starts_with("application/json") {
        let Json(body) = Json::<PromptBody>::from_request(request, &gateway)
            .await
            .map_err(|e| Error::InvalidInput(e.body_text()))?;
        body.prompt
    } else {
        let Form(body) = Form::<PromptBody>::from_request(request, &gateway)
            .await
            .map_err(|e| Error::InvalidInput(e.body_text()))?;
        body.prompt
    };

    let result = gateway.generate(InputKind::Text, prompt, None).await?;
    Ok(Json(result))
}

async fn generate_upload(
    gateway: &Gateway,
    kind: InputKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult {
    let multipart = multipart.map_err(|e| Error::Attachment(e.body_text()))?;
    let form = read_upload(multipart, kind.file_field()).await?;
    let result = gateway.generate(kind, form.prompt, form.attachment).await?;
    Ok(Json(result))
}

/// `POST /generate-from-image`
pub async fn generate_from_image(
    State(gateway): State<SharedGateway>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult {
    generate_upload(&gateway, InputKind::Image, multipart).await
}

/// `POST /generate-from-document`
pub async fn generate_from_document(
    State(gateway): State<SharedGateway>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult {
    generate_upload(&gateway, InputKind::Document, multipart).await
}

/// `POST /generate-from-audio`
pub async fn generate_from_audio(
    State(gateway): State<SharedGateway>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult {
    generate_upload(&gateway, InputKind::Audio, multipart).await
}

/// `POST /api/chat`
pub async fn chat(
    State(gateway): State<SharedGateway>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload.map_err(|e| Error::InvalidInput(e.body_text()))?;
    let result = gateway.chat(request.conversation).await?;
    Ok(Json(result))
}
