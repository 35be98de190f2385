use crate::summarizer::{PartialEntry, PartialSummary};
use crate::types::{
    Artifact, ArtifactPayload, InvocationRequest, Modality, ModelSpec, Result, SummarizerError,
};
use crate::utils::text::truncate_chars;

const TEXT_INSTRUCTION: &str = "Below is the extracted content of one or more files from a shared folder. \
For each file, write a faithful, detailed summary of its content: main topics, key facts, \
names, dates and figures. Do not invent anything that is not in the text.";

const IMAGE_INSTRUCTION: &str = "This image is most likely a scan or photo of a document page, \
and its quality may be poor. \
1) Carefully recognise and transcribe ALL text visible in the image, keeping its original language. \
2) If the text is unreadable or absent, describe the content of the image in as much detail as possible. \
3) State the language of the text and the general type of document, if it can be determined.";

const AGGREGATION_INSTRUCTION: &str = "Below is the content or description of every file in the folder. \
Write one detailed summary that covers ALL files in the folder.";

/// Builds prompts for per-file extraction and the final aggregation call.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    language: String,
    max_chars_per_artifact: usize,
}

impl RequestBuilder {
    pub fn new(language: impl Into<String>, max_chars_per_artifact: usize) -> Self {
        Self {
            language: language.into(),
            max_chars_per_artifact,
        }
    }

    /// One request for a batch of same-modality artifacts.
    pub fn build_request(&self, artifacts: &[Artifact], model: &ModelSpec) -> Result<InvocationRequest> {
        let first = artifacts.first().ok_or_else(|| {
            SummarizerError::InvalidInput("cannot build a request without artifacts".to_string())
        })?;
        let modality = first.modality();
        if let Some(other) = artifacts.iter().find(|a| a.modality() != modality) {
            return Err(SummarizerError::InvalidInput(format!(
                "mixed modalities in one request: {} is {}, expected {}",
                other.identifier,
                other.modality(),
                modality
            )));
        }

        match modality {
            Modality::Text => {
                let sections: Vec<String> = artifacts
                    .iter()
                    .filter_map(|artifact| match &artifact.payload {
                        ArtifactPayload::Text(text) => Some(format!(
                            "### File: {}\n\n{}",
                            artifact.identifier,
                            truncate_chars(text, self.max_chars_per_artifact)
                        )),
                        ArtifactPayload::Image(_) => None,
                    })
                    .collect();
                Ok(InvocationRequest {
                    modality,
                    model_identifier: model.identifier.clone(),
                    system_text: None,
                    prompt_text: format!(
                        "{} Answer in {}.\n\n{}",
                        TEXT_INSTRUCTION,
                        self.language,
                        sections.join("\n\n---\n\n")
                    ),
                    images: Vec::new(),
                })
            }
            Modality::Image => {
                let images: Vec<Vec<u8>> = artifacts
                    .iter()
                    .filter_map(|artifact| match &artifact.payload {
                        ArtifactPayload::Image(png) => Some(png.clone()),
                        ArtifactPayload::Text(_) => None,
                    })
                    .collect();
                Ok(InvocationRequest {
                    modality,
                    model_identifier: model.identifier.clone(),
                    system_text: None,
                    prompt_text: IMAGE_INSTRUCTION.to_string(),
                    images,
                })
            }
        }
    }

    /// The single text request that merges every per-file entry.
    pub fn build_aggregation_request(
        &self,
        partials: &PartialSummary,
        model: &ModelSpec,
    ) -> Result<InvocationRequest> {
        if partials.is_empty() {
            return Err(SummarizerError::InvalidInput(
                "cannot aggregate an empty set of file summaries".to_string(),
            ));
        }

        let sections: Vec<String> = partials
            .iter()
            .map(|(identifier, entry)| {
                let body = match entry {
                    PartialEntry::Extracted(text) => truncate_chars(text, self.max_chars_per_artifact),
                    PartialEntry::Unavailable(_) => PartialEntry::PLACEHOLDER.to_string(),
                };
                format!("### File: {}\n\n{}", identifier, body)
            })
            .collect();

        Ok(InvocationRequest {
            modality: Modality::Text,
            model_identifier: model.identifier.clone(),
            system_text: Some(format!(
                "You are an expert analyst. The user will give you descriptions or extracted \
                 content of several files from one folder. Produce a coherent, well-structured \
                 summary that covers ALL of the files. Highlight key themes, relationships \
                 between files, and any notable details. Answer in {}.",
                self.language
            )),
            prompt_text: format!("{}\n\n{}", AGGREGATION_INSTRUCTION, sections.join("\n\n---\n\n")),
            images: Vec::new(),
        })
    }
}
