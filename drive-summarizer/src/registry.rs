use crate::types::{LlmConfig, Modality, ModelSpec};
use tracing::debug;

/// Ordered candidate models per modality. Index 0 is tried first.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    text: Vec<ModelSpec>,
    vision: Vec<ModelSpec>,
}

impl ModelRegistry {
    pub fn new(text: Vec<ModelSpec>, vision: Vec<ModelSpec>) -> Self {
        Self { text, vision }
    }

    /// Primary model followed by its fallbacks, first occurrence wins.
    pub fn from_config(config: &LlmConfig) -> Self {
        let text = chain(Modality::Text, &config.text_model, &config.text_fallback_models);
        let vision = chain(Modality::Image, &config.vision_model, &config.vision_fallback_models);
        debug!(
            "Model registry: {} text model(s), {} vision model(s)",
            text.len(),
            vision.len()
        );
        Self { text, vision }
    }

    pub fn models(&self, modality: Modality) -> &[ModelSpec] {
        match modality {
            Modality::Text => &self.text,
            Modality::Image => &self.vision,
        }
    }

    pub fn preferred(&self, modality: Modality) -> Option<&ModelSpec> {
        self.models(modality).first()
    }
}

fn chain(modality: Modality, primary: &str, fallbacks: &[String]) -> Vec<ModelSpec> {
    let mut identifiers: Vec<&str> = Vec::with_capacity(fallbacks.len() + 1);
    for identifier in std::iter::once(primary).chain(fallbacks.iter().map(String::as_str)) {
        if !identifier.is_empty() && !identifiers.contains(&identifier) {
            identifiers.push(identifier);
        }
    }
    identifiers
        .into_iter()
        .map(|identifier| ModelSpec::new(identifier, modality))
        .collect()
}
