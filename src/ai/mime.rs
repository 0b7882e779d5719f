pub const OCTET_STREAM: &str = "application/octet-stream";

/// Sniff a MIME type from magic bytes for the upload kinds the gateway accepts.
pub fn detect_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x41, 0x56, 0x45, ..] => Some("audio/wav"),
        [0x25, 0x50, 0x44, 0x46, ..] => Some("application/pdf"),
        [0x49, 0x44, 0x33, ..] | [0xFF, 0xFB | 0xF3 | 0xF2, ..] => Some("audio/mpeg"),
        [0x4F, 0x67, 0x67, 0x53, ..] => Some("audio/ogg"),
        [0x66, 0x4C, 0x61, 0x43, ..] => Some("audio/flac"),
        _ => None,
    }
}

/// Pick the MIME type to forward for an upload.
///
/// A declared type, `application/octet-stream` included, is passed through
/// untouched; only a part without a content type falls back to sniffing.
pub fn resolve_mime(declared: Option<&str>, bytes: &[u8]) -> String {
    match declared.map(str::trim).filter(|m| !m.is_empty()) {
        Some(mime) => mime.to_string(),
        None => match detect_mime(bytes) {
            Some(mime) => mime.to_string(),
            None => {
                tracing::warn!(
                    "Unrecognized upload format (first 4 bytes: {:02X?}), falling back to {}",
                    &bytes[..bytes.len().min(4)],
                    OCTET_STREAM
                );
                OCTET_STREAM.to_string()
            }
        },
    }
}
