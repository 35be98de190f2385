use crate::traits::Processor;
use crate::types::{ArtifactPayload, Result};
use encoding_rs::WINDOWS_1251;
use std::path::Path;
use tracing::{debug, info};

/// Reads text files as-is, trying UTF-8, Windows-1251 and Latin-1 in order.
pub struct TextProcessor;

impl TextProcessor {
    pub const EXTENSIONS: &'static [&'static str] =
        &["txt", "md", "csv", "json", "xml", "html", "htm", "log", "rst"];

    pub fn decode(bytes: &[u8]) -> (String, &'static str) {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        if let Ok(text) = std::str::from_utf8(bytes) {
            return (text.to_string(), "utf-8");
        }
        if let Some(text) = WINDOWS_1251.decode_without_bom_handling_and_without_replacement(bytes) {
            return (text.into_owned(), "windows-1251");
        }
        // Every byte is a valid Latin-1 code point.
        (bytes.iter().map(|&b| b as char).collect(), "latin-1")
    }
}

impl Processor for TextProcessor {
    fn processor_name(&self) -> &'static str {
        "TextProcessor"
    }

    fn extract(&self, path: &Path) -> Result<ArtifactPayload> {
        debug!("Reading text file: {}", path.display());
        let bytes = std::fs::read(path)?;
        let (text, encoding) = Self::decode(&bytes);
        info!(
            "Read {} chars from {} (encoding={})",
            text.chars().count(),
            path.display(),
            encoding
        );
        Ok(ArtifactPayload::Text(text))
    }
}
