pub mod gemini;
pub mod prompt;
pub mod request;
pub mod service;

use super::{config::NarrativeConfig, record::Record};
use std::{borrow::Borrow, sync::Arc};
use tracing::{info, warn};

pub use gemini::{GeminiClient, GenerationConfig};
pub use prompt::{Prompt, PromptBuilder};
pub use request::{RequestKind, RequestState};
pub use service::{DisabledService, NarrativeService};

pub const NO_DATA_MESSAGE: &str =
    "No data available for the selected filters. Please adjust your filters and try again.";
pub const UNAVAILABLE_MESSAGE: &str = "Unable to generate insights right now. Please try again later.";

// Outcome of one narrative action as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrative {
    Answered(String),
    NoData,
    Unavailable { reason: String },
}

impl Narrative {
    pub fn text(&self) -> &str {
        match self {
            Self::Answered(text) => text,
            Self::NoData => NO_DATA_MESSAGE,
            Self::Unavailable { .. } => UNAVAILABLE_MESSAGE,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}

impl From<Narrative> for RequestState {
    fn from(narrative: Narrative) -> Self {
        match narrative {
            Narrative::Answered(text) => Self::Succeeded(text),
            Narrative::NoData => Self::Succeeded(NO_DATA_MESSAGE.to_string()),
            Narrative::Unavailable { .. } => Self::Failed(UNAVAILABLE_MESSAGE.to_string()),
        }
    }
}

// Narrator - prompt building plus the service call. Never fails outward:
// every error ends up as Narrative::Unavailable.
#[derive(Clone)]
pub struct Narrator {
    service: Arc<dyn NarrativeService>,
    builder: PromptBuilder,
}

impl std::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator")
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

impl Default for Narrator {
    fn default() -> Self {
        Self::new(
            Arc::new(DisabledService::new("no narrative service configured")),
            PromptBuilder::default(),
        )
    }
}

impl Narrator {
    pub fn new(service: Arc<dyn NarrativeService>, builder: PromptBuilder) -> Self {
        Self { service, builder }
    }

    // Gemini client when an API key is configured, a disabled service otherwise
    pub fn from_config(config: &NarrativeConfig) -> Self {
        let builder = PromptBuilder::new(config.sample_limit);
        match GeminiClient::new(config) {
            Ok(client) => Self::new(Arc::new(client), builder),
            Err(e) => {
                info!(reason = %e, "narrative service disabled");
                Self::new(Arc::new(DisabledService::new(e.to_string())), builder)
            }
        }
    }

    pub fn builder(&self) -> &PromptBuilder {
        &self.builder
    }

    pub async fn answer<R>(&self, filtered: &[R], question: &str) -> Narrative
    where
        R: Borrow<Record>,
    {
        let prompt = match self.builder.build(filtered, question) {
            Ok(Some(prompt)) => prompt,
            Ok(None) => return Narrative::NoData,
            Err(e) => {
                warn!(error = %e, "failed to build narrative prompt");
                return Narrative::Unavailable { reason: e.to_string() };
            }
        };
        self.submit(&prompt).await
    }

    pub async fn submit(&self, prompt: &Prompt) -> Narrative {
        match self.service.generate(prompt).await {
            Ok(text) => {
                info!(sample = prompt.sample, total = prompt.total, chars = text.len(), "narrative generated");
                Narrative::Answered(text)
            }
            Err(e) => {
                warn!(error = %e, "narrative service failed");
                Narrative::Unavailable { reason: e.to_string() }
            }
        }
    }
}
