use crate::llm_adapter::Invoker;
use crate::request::RequestBuilder;
use crate::types::{
    Artifact, InvocationResult, Modality, Result, SummarizerConfig, SummarizerError,
};
use crate::utils::text::preview;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Per-file outcome recorded before aggregation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialEntry {
    Extracted(String),
    Unavailable(String),
}

impl PartialEntry {
    pub const PLACEHOLDER: &'static str = "(extraction unavailable)";

    pub fn is_extracted(&self) -> bool {
        matches!(self, PartialEntry::Extracted(_))
    }
}

/// Ordered identifier -> entry mapping, one entry per artifact.
#[derive(Debug, Clone, Default)]
pub struct PartialSummary {
    entries: IndexMap<String, PartialEntry>,
}

impl PartialSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry; a repeated identifier gets a `#n` suffix so no
    /// artifact overwrites another.
    pub fn record(&mut self, identifier: &str, entry: PartialEntry) {
        let mut key = identifier.to_string();
        let mut n = 2;
        while self.entries.contains_key(&key) {
            key = format!("{}#{}", identifier, n);
            n += 1;
        }
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&PartialEntry> {
        self.entries.get(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PartialEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn extracted_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_extracted()).count()
    }
}

#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub summary: String,
    pub partials: PartialSummary,
}

impl SummaryReport {
    pub fn unavailable(&self) -> Vec<&str> {
        self.partials
            .iter()
            .filter(|(_, entry)| !entry.is_extracted())
            .map(|(identifier, _)| identifier)
            .collect()
    }
}

/// Per-artifact extraction followed by one aggregation call.
pub struct Summarizer {
    invoker: Invoker,
    builder: RequestBuilder,
}

impl Summarizer {
    pub fn new(invoker: Invoker, config: &SummarizerConfig) -> Self {
        Self {
            invoker,
            builder: RequestBuilder::new(config.language.clone(), config.max_chars_per_artifact),
        }
    }

    pub async fn summarize(&self, artifacts: &[Artifact]) -> Result<String> {
        Ok(self.summarize_report(artifacts).await?.summary)
    }

    pub async fn summarize_report(&self, artifacts: &[Artifact]) -> Result<SummaryReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("summarize", %run_id);
        self.run(run_id, artifacts).instrument(span).await
    }

    /// One entry per artifact, in order. Individual failures become placeholders.
    pub async fn extract_partials(&self, artifacts: &[Artifact]) -> PartialSummary {
        let mut partials = PartialSummary::new();

        for (index, artifact) in artifacts.iter().enumerate() {
            info!(
                "Processing {} ({}/{}, {})",
                artifact.identifier,
                index + 1,
                artifacts.len(),
                artifact.modality()
            );
            let entry = self.extract_one(artifact).await;
            if let PartialEntry::Unavailable(reason) = &entry {
                warn!("No content for {}: {}", artifact.identifier, reason);
            }
            partials.record(&artifact.identifier, entry);
        }

        partials
    }

    async fn extract_one(&self, artifact: &Artifact) -> PartialEntry {
        let modality = artifact.modality();
        let Some(model) = self.invoker.registry().preferred(modality) else {
            return PartialEntry::Unavailable(format!("no {} models configured", modality));
        };

        let request = match self.builder.build_request(std::slice::from_ref(artifact), model) {
            Ok(request) => request,
            Err(e) => return PartialEntry::Unavailable(e.to_string()),
        };

        match self.invoker.invoke(modality, &request).await {
            InvocationResult::Success { text, .. } => {
                info!("Got {} chars for {}: {}", text.chars().count(), artifact.identifier, preview(&text, 80));
                PartialEntry::Extracted(text)
            }
            InvocationResult::Failure { kind, reason, .. } => {
                PartialEntry::Unavailable(format!("{}: {}", kind, reason))
            }
        }
    }

    async fn run(&self, run_id: Uuid, artifacts: &[Artifact]) -> Result<SummaryReport> {
        if artifacts.is_empty() {
            return Err(SummarizerError::InvalidInput("no artifacts to summarize".to_string()));
        }

        let partials = self.extract_partials(artifacts).await;
        if partials.extracted_count() == 0 {
            return Err(SummarizerError::NothingExtracted);
        }

        let model = self
            .invoker
            .registry()
            .preferred(Modality::Text)
            .ok_or_else(|| SummarizerError::Config("no text models configured".to_string()))?;
        let request = self.builder.build_aggregation_request(&partials, model)?;

        info!(
            "Generating final summary over {} file(s) ({} with content)",
            partials.len(),
            partials.extracted_count()
        );
        match self.invoker.invoke(Modality::Text, &request).await {
            InvocationResult::Success { text, model } => Ok(SummaryReport {
                run_id,
                generated_at: Utc::now(),
                model,
                summary: text,
                partials,
            }),
            InvocationResult::Failure { kind, reason, .. } => {
                Err(SummarizerError::Aggregation { kind, reason })
            }
        }
    }
}
