use serde::{Deserialize, Serialize};

// The two narrative actions. Each has its own state and never blocks the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Search,
    Recommendation,
}

impl RequestKind {
    pub const ALL: [RequestKind; 2] = [Self::Search, Self::Recommendation];

    pub fn label(self) -> &'static str {
        match self {
            Self::Search => "Search",
            Self::Recommendation => "Recommendation",
        }
    }

    // Question used when the action is triggered without one
    pub fn default_question(self) -> &'static str {
        match self {
            Self::Search => "Summarize the key characteristics of these customers.",
            Self::Recommendation => {
                "Based on these customers, recommend marketing strategies and product offers \
                 that fit their demographics, preferred channels and purchase behaviour."
            }
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// Idle -> Requesting -> Succeeded | Failed, and back to Requesting on the next action
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Requesting {
        ticket: u64,
    },
    Succeeded(String),
    Failed(String),
}

impl RequestState {
    pub fn is_requesting(&self) -> bool {
        matches!(self, Self::Requesting { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Succeeded(text) | Self::Failed(text) => Some(text),
            _ => None,
        }
    }
}
