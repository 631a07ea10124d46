use super::prompt::Prompt;
use crate::{errors::NarrativeError, result::NarrativeResult};
use async_trait::async_trait;

// One prompt in, one generated text out. No streaming and no history.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> NarrativeResult<String>;
}

// Stand-in used when no API key is configured
#[derive(Debug, Clone, Default)]
pub struct DisabledService {
    reason: String,
}

impl DisabledService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl NarrativeService for DisabledService {
    async fn generate(&self, _prompt: &Prompt) -> NarrativeResult<String> {
        Err(NarrativeError::NotConfigured {
            reason: self.reason.clone(),
        })
    }
}
