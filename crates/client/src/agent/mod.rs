//! Site information extraction agent.
//!
//! The agent is a small state machine: `Start → Extracting → {Completed, Failed}`.
//! There is exactly one worker step. Each call owns its [`AgentState`]; the
//! state is moved into a step and a new state comes back, so concurrent calls
//! on one agent share nothing but the read-only backend.
//!
//! ### Outcomes
//! - backend answered, payload decoded → `success`
//! - backend answered, payload not a JSON object → `parsed_error` with the raw text
//! - backend failed → `error`, plus a synthetic assistant message in the history

pub mod parse;
pub mod prompt;
pub mod result;

pub use parse::{ParseError, extract_payload, parse_response};
pub use prompt::{DEFAULT_SYSTEM_PROMPT, ExtractionRequest, PageContext, load_system_prompt};
pub use result::{ExtractionResult, ExtractionStatus};

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use sitex_core::{Error, ProviderCredentials};

use crate::llm::{Backend, BackendRegistry, ChatModel, DEFAULT_REQUEST_TIMEOUT, Message, ResolvedBackend, resolve};

/// Position of one extraction in the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Extracting,
    Completed,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Failed)
    }
}

/// State threaded through one extraction.
#[derive(Debug, Clone)]
pub struct AgentState {
    pub request: ExtractionRequest,
    /// Conversation history, append-only within this call.
    pub messages: Vec<Message>,
    /// Set once the extracting step has run.
    pub result: Option<ExtractionResult>,
    pub stage: Stage,
}

impl AgentState {
    pub fn new(request: ExtractionRequest) -> Self {
        Self { request, messages: Vec::new(), result: None, stage: Stage::Start }
    }

    /// The final result, or an `error` result if the machine never produced one.
    pub fn into_result(self) -> ExtractionResult {
        let url = self.request.url;
        self.result
            .unwrap_or_else(|| ExtractionResult::error(&url, "extraction did not run"))
    }
}

/// Extracts structured site information with one language-model call per URL.
pub struct ExtractionAgent {
    backend: ResolvedBackend,
    model: Arc<dyn ChatModel>,
    system_prompt: String,
}

impl ExtractionAgent {
    /// Resolve a provider from `credentials` and build its HTTP backend.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` when no credential is usable, or
    /// `Error::Backend` if the HTTP client cannot be built.
    pub fn new(credentials: &ProviderCredentials) -> Result<Self, Error> {
        Self::with_registry(credentials, &BackendRegistry::builtin(), DEFAULT_REQUEST_TIMEOUT)
    }

    /// Like [`ExtractionAgent::new`] with an explicit registry and request timeout.
    pub fn with_registry(
        credentials: &ProviderCredentials, registry: &BackendRegistry, timeout: Duration,
    ) -> Result<Self, Error> {
        let resolved = resolve(credentials, registry)?;
        let backend = Backend::from_resolved(&resolved, timeout)?;

        tracing::info!(provider = %resolved.provider, model = %resolved.model, "extraction agent ready");

        Ok(Self::from_parts(resolved, Arc::new(backend)))
    }

    /// Assemble an agent from an already resolved backend and any model implementation.
    pub fn from_parts(backend: ResolvedBackend, model: Arc<dyn ChatModel>) -> Self {
        Self { backend, model, system_prompt: DEFAULT_SYSTEM_PROMPT.to_string() }
    }

    /// Replace the built-in system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn backend(&self) -> &ResolvedBackend {
        &self.backend
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Extract site information for `url`.
    ///
    /// Never fails: backend and parse failures come back as status-tagged results.
    pub async fn extract(&self, url: &str) -> ExtractionResult {
        self.extract_request(ExtractionRequest::new(url)).await
    }

    /// Extract with optional page context in the prompt.
    pub async fn extract_request(&self, request: ExtractionRequest) -> ExtractionResult {
        self.run(request).await.into_result()
    }

    /// Drive the state machine to a terminal stage and return the full state.
    pub async fn run(&self, request: ExtractionRequest) -> AgentState {
        let mut state = AgentState::new(request);
        while !state.stage.is_terminal() {
            state = self.step(state).await;
        }
        state
    }

    async fn step(&self, state: AgentState) -> AgentState {
        match state.stage {
            Stage::Start => self.seed(state),
            Stage::Extracting => self.extract_node(state).await,
            Stage::Completed | Stage::Failed => state,
        }
    }

    /// Fresh history: the system prompt and one human message for this URL.
    fn seed(&self, state: AgentState) -> AgentState {
        let messages = vec![Message::system(self.system_prompt.clone()), Message::human(state.request.human_message())];
        AgentState { messages, stage: Stage::Extracting, ..state }
    }

    async fn extract_node(&self, state: AgentState) -> AgentState {
        let AgentState { request, mut messages, .. } = state;
        let start = Instant::now();

        match self.model.complete(&messages).await {
            Ok(text) => {
                let result = interpret_response(&request.url, &text);
                tracing::debug!(
                    url = %request.url,
                    status = %result.status(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "extraction completed"
                );
                messages.push(Message::assistant(text));
                AgentState { request, messages, result: Some(result), stage: Stage::Completed }
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, transient = e.is_transient(), "extraction failed");
                messages.push(Message::assistant(format!("Extraction failed: {e}")));
                let result = ExtractionResult::error(&request.url, &e.to_string());
                AgentState { request, messages, result: Some(result), stage: Stage::Failed }
            }
        }
    }
}

/// Turn raw model text into a `success` or `parsed_error` result.
pub fn interpret_response(url: &str, text: &str) -> ExtractionResult {
    let failure = match parse_response(text) {
        Ok(Value::Object(payload)) => return ExtractionResult::success(url, payload),
        Ok(other) => format!("expected a JSON object, found {}", json_kind(&other)),
        Err(e) => e.to_string(),
    };

    tracing::warn!(url, parse_error = %failure, "model response is not structured data");
    ExtractionResult::parsed_error(url, text, &failure)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
