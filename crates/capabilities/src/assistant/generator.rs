use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a text generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The generator could not be reached or timed out.
    #[error("Text generator unavailable: {0}")]
    Unavailable(String),

    /// The generator answered with an error status.
    #[error("Text generator error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response carried no usable text.
    #[error("Text generator returned no text")]
    EmptyResponse,

    /// The response body could not be decoded.
    #[error("Malformed text generator response: {0}")]
    Decode(String),
}

/// Turns a prompt into natural-language text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Default)]
struct ScriptedState {
    responses: VecDeque<String>,
    prompts: Vec<String>,
    fail: bool,
}

/// Replays queued responses in order, recording every prompt it receives.
/// Fails once the queue is empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTextGenerator {
    state: Arc<RwLock<ScriptedState>>,
}

impl ScriptedTextGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for response in responses {
            generator.push_response(response);
        }
        generator
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.state
            .write()
            .unwrap()
            .responses
            .push_back(response.into());
    }

    /// Makes every call fail until reset.
    pub fn set_fail(&self, fail: bool) {
        self.state.write().unwrap().fail = fail;
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.state.read().unwrap().prompts.clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut state = self.state.write().unwrap();
        state.prompts.push(prompt.to_string());
        if state.fail {
            return Err(GenerationError::Unavailable("quota exceeded".to_string()));
        }
        state
            .responses
            .pop_front()
            .ok_or_else(|| GenerationError::Unavailable("no scripted response".to_string()))
    }
}
