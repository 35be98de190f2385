use crate::traits::Processor;
use crate::types::{ArtifactPayload, Result, SummarizerError};
use std::path::Path;
use tracing::{error, info, warn};

/// Extracts the text layer of a PDF. Scanned PDFs without one fail extraction.
pub struct PdfProcessor;

impl Processor for PdfProcessor {
    fn processor_name(&self) -> &'static str {
        "PdfProcessor"
    }

    fn extract(&self, path: &Path) -> Result<ArtifactPayload> {
        let identifier = path.display().to_string();
        let bytes = std::fs::read(path)?;

        // pdf-extract can panic on malformed fonts
        let extracted = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        }));

        let raw = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("PDF extraction failed for {}: {}", identifier, e);
                return Err(SummarizerError::Extraction {
                    identifier,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                error!("PDF extraction panicked for {}", identifier);
                return Err(SummarizerError::Extraction {
                    identifier,
                    reason: "PDF parser panicked, the file is likely malformed".to_string(),
                });
            }
        };

        let sections: Vec<&str> = raw
            .split('\u{c}')
            .map(str::trim)
            .filter(|section| !section.is_empty())
            .collect();
        let text = sections.join("\n\n");
        if text.is_empty() {
            return Err(SummarizerError::Extraction {
                identifier,
                reason: "no extractable text layer".to_string(),
            });
        }

        info!(
            "Extracted {} section(s), {} chars from {}",
            sections.len(),
            text.chars().count(),
            identifier
        );
        Ok(ArtifactPayload::Text(text))
    }
}
