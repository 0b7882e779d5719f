//! HTTP gateway for the Gemini generative-language API
//!
//! Accepts text, image, document and audio inputs (plus a chat endpoint),
//! adapts them into Gemini content parts and returns the generated text.

pub mod ai;
pub mod app;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod prompts;

pub use error::{Error, Result};
