use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Modality {
    Text,
    Image,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Text => f.write_str("text"),
            Modality::Image => f.write_str("image"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactPayload {
    Text(String),
    // Preprocessed PNG bytes.
    Image(Vec<u8>),
}

/// One extracted file, ready to be handed to a model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub identifier: String,
    pub payload: ArtifactPayload,
}

impl Artifact {
    pub fn text(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            payload: ArtifactPayload::Text(text.into()),
        }
    }

    pub fn image(identifier: impl Into<String>, png: Vec<u8>) -> Self {
        Self {
            identifier: identifier.into(),
            payload: ArtifactPayload::Image(png),
        }
    }

    pub fn modality(&self) -> Modality {
        match self.payload {
            ArtifactPayload::Text(_) => Modality::Text,
            ArtifactPayload::Image(_) => Modality::Image,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Free,
    Paid,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    pub identifier: String,
    pub modality: Modality,
    pub tier: Tier,
}

impl ModelSpec {
    /// Tier follows the `:free` suffix convention of model identifiers.
    pub fn new(identifier: impl Into<String>, modality: Modality) -> Self {
        let identifier = identifier.into();
        let tier = if identifier.ends_with(":free") { Tier::Free } else { Tier::Paid };
        Self { identifier, modality, tier }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationRequest {
    pub modality: Modality,
    pub model_identifier: String,
    pub system_text: Option<String>,
    pub prompt_text: String,
    pub images: Vec<Vec<u8>>,
}

impl InvocationRequest {
    /// Same prompt, addressed to another model.
    pub fn with_model(&self, model: &ModelSpec) -> Self {
        Self {
            model_identifier: model.identifier.clone(),
            ..self.clone()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Transient,
    ModelRejected,
    AllModelsExhausted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Transient => "transient",
            ErrorKind::ModelRejected => "model rejected",
            ErrorKind::AllModelsExhausted => "all models exhausted",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationResult {
    Success {
        text: String,
        model: String,
    },
    Failure {
        kind: ErrorKind,
        retriable: bool,
        reason: String,
    },
}

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success { .. })
    }
}
