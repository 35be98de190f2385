use crate::registry::ModelRegistry;
use crate::traits::{Transport, TransportError};
use crate::types::{ErrorKind, InvocationRequest, InvocationResult, LlmConfig, Modality};
use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How a failed attempt is handled by the fallback loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Capacity problem; resend to the same model after a wait.
    Transient,
    /// The model itself refuses or cannot serve the request; move on.
    Rejected,
}

/// Maps transport errors onto [`FailureClass`]. Only the listed statuses and
/// network failures are retried in place.
#[derive(Debug, Clone)]
pub struct StatusPolicy {
    transient_statuses: Vec<u16>,
}

impl StatusPolicy {
    pub fn new(transient_statuses: Vec<u16>) -> Self {
        Self { transient_statuses }
    }

    pub fn classify(&self, error: &TransportError) -> FailureClass {
        match error {
            TransportError::Status { status, .. } if self.transient_statuses.contains(status) => {
                FailureClass::Transient
            }
            TransportError::Status { .. } => FailureClass::Rejected,
            TransportError::Network(_) => FailureClass::Transient,
            TransportError::EmptyCompletion(_) => FailureClass::Rejected,
        }
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::new(vec![429, 402, 503])
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Deterministic doubling: base, 2*base, 4*base ... capped at `max_delay`.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: self.max_delay,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Position inside one `invoke` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackState {
    pub model_index: usize,
    pub attempt: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Retry(FallbackState),
    Fallback(FallbackState),
    Exhausted,
}

impl FallbackState {
    pub fn start() -> Self {
        Self { model_index: 0, attempt: 0 }
    }

    /// Next state after a failed attempt. The model index never decreases.
    pub fn on_failure(self, class: FailureClass, max_attempts: u32, model_count: usize) -> Transition {
        if class == FailureClass::Transient && self.attempt + 1 < max_attempts {
            return Transition::Retry(FallbackState {
                attempt: self.attempt + 1,
                ..self
            });
        }
        if self.model_index + 1 < model_count {
            Transition::Fallback(FallbackState {
                model_index: self.model_index + 1,
                attempt: 0,
            })
        } else {
            Transition::Exhausted
        }
    }
}

/// Drives requests through the model fallback chain with in-place retries.
pub struct Invoker {
    transport: Arc<dyn Transport>,
    registry: ModelRegistry,
    retry: RetryPolicy,
    status_policy: StatusPolicy,
}

impl Invoker {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: ModelRegistry,
        retry: RetryPolicy,
        status_policy: StatusPolicy,
    ) -> Self {
        Self {
            transport,
            registry,
            retry,
            status_policy,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &LlmConfig) -> Self {
        Self::new(
            transport,
            ModelRegistry::from_config(config),
            RetryPolicy {
                max_attempts: config.max_attempts,
                base_delay: config.retry_base_delay,
                max_delay: config.max_retry_delay,
            },
            StatusPolicy::new(config.transient_statuses.clone()),
        )
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub async fn invoke(&self, modality: Modality, request: &InvocationRequest) -> InvocationResult {
        if let Err(reason) = validate_request(modality, request) {
            warn!("Rejecting {} request before sending: {}", modality, reason);
            return InvocationResult::Failure {
                kind: ErrorKind::InvalidInput,
                retriable: false,
                reason,
            };
        }

        let models = self.registry.models(modality);
        if models.is_empty() {
            return InvocationResult::Failure {
                kind: ErrorKind::AllModelsExhausted,
                retriable: false,
                reason: format!("no {} models configured", modality),
            };
        }

        let mut state = FallbackState::start();
        let mut backoff = self.retry.backoff();
        let mut last_error = String::new();

        loop {
            let model = &models[state.model_index];
            let attempt_request = request.with_model(model);
            debug!(
                "Sending {} request to {} (attempt {}/{})",
                modality,
                model.identifier,
                state.attempt + 1,
                self.retry.max_attempts
            );

            let class = match self.transport.send(&attempt_request).await {
                Ok(text) => {
                    info!("Reply from {} ({} chars)", model.identifier, text.chars().count());
                    return InvocationResult::Success {
                        text,
                        model: model.identifier.clone(),
                    };
                }
                Err(err) => {
                    last_error = format!("{}: {}", model.identifier, err);
                    self.status_policy.classify(&err)
                }
            };

            match state.on_failure(class, self.retry.max_attempts, models.len()) {
                Transition::Retry(next) => {
                    let delay = backoff.next_backoff().unwrap_or(self.retry.max_delay);
                    warn!(
                        "{} (transient), retrying in {:?} (attempt {}/{})",
                        last_error,
                        delay,
                        next.attempt + 1,
                        self.retry.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                    state = next;
                }
                Transition::Fallback(next) => {
                    warn!(
                        "{} ({:?}), falling back to {}",
                        last_error, class, models[next.model_index].identifier
                    );
                    backoff.reset();
                    state = next;
                }
                Transition::Exhausted => {
                    error!("All {} {} model(s) failed", models.len(), modality);
                    return InvocationResult::Failure {
                        kind: ErrorKind::AllModelsExhausted,
                        retriable: false,
                        reason: format!(
                            "all {} {} model(s) failed; last error: {}",
                            models.len(),
                            modality,
                            last_error
                        ),
                    };
                }
            }
        }
    }
}

fn validate_request(modality: Modality, request: &InvocationRequest) -> Result<(), String> {
    if request.modality != modality {
        return Err(format!(
            "request was built for {} but invoked as {}",
            request.modality, modality
        ));
    }
    if request.prompt_text.trim().is_empty() {
        return Err("prompt text is empty".to_string());
    }
    if modality == Modality::Image && request.images.is_empty() {
        return Err("image request carries no image data".to_string());
    }
    Ok(())
}

/// Scripted reply for [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Text(String),
    Status(u16),
    Network,
    Empty,
}

/// A transport call as seen by [`MockTransport`]
#[derive(Debug, Clone)]
pub struct MockCall {
    pub model: String,
    pub modality: Modality,
    pub prompt: String,
    pub at: tokio::time::Instant,
}

/// Offline transport for development and testing. Replies come from a
/// per-model script, then a per-model standing reply, then an echo of the
/// prompt tagged with the model name.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<String, VecDeque<MockReply>>>,
    standing: HashMap<String, MockReply>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies for `model`, consumed one per call.
    pub fn script<I>(self, model: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = MockReply>,
    {
        self.lock_scripts()
            .entry(model.to_string())
            .or_default()
            .extend(replies);
        self
    }

    /// Reply used for `model` whenever its script is empty.
    pub fn always(mut self, model: &str, reply: MockReply) -> Self {
        self.standing.insert(model.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.model).collect()
    }

    fn lock_scripts(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<MockReply>>> {
        self.scripts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &InvocationRequest) -> std::result::Result<String, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(MockCall {
                model: request.model_identifier.clone(),
                modality: request.modality,
                prompt: request.prompt_text.clone(),
                at: tokio::time::Instant::now(),
            });

        let scripted = self
            .lock_scripts()
            .get_mut(&request.model_identifier)
            .and_then(|queue| queue.pop_front());
        let reply = scripted.or_else(|| self.standing.get(&request.model_identifier).cloned());

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Status(status)) => Err(TransportError::Status {
                status,
                message: format!("mock status {}", status),
            }),
            Some(MockReply::Network) => Err(TransportError::Network("mock connection reset".to_string())),
            Some(MockReply::Empty) => Err(TransportError::EmptyCompletion("mock empty choices".to_string())),
            None => Ok(format!("[{}] {}", request.model_identifier, request.prompt_text)),
        }
    }
}
