pub mod client;
pub mod generate;
pub mod types;

pub use client::GeminiHttpClient;
pub use generate::GeminiClient;

/// Model used by every gateway endpoint unless overridden by `GEMINI_MODEL`.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
