//! Realtime notification payloads emitted by batch screening.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::DecisionType;

/// Outcome of one automated evaluation inside a batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreeningEvent {
    AiScreeningComplete {
        article_id: i64,
        decision: DecisionType,
        confidence: f64,
    },
    AiScreeningError {
        article_id: i64,
        error: String,
    },
}

impl ScreeningEvent {
    #[must_use]
    pub const fn article_id(&self) -> i64 {
        match self {
            Self::AiScreeningComplete { article_id, .. } | Self::AiScreeningError { article_id, .. } => {
                *article_id
            }
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::AiScreeningError { .. })
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AiScreeningComplete { .. } => "ai_screening_complete",
            Self::AiScreeningError { .. } => "ai_screening_error",
        }
    }
}

/// Audience of a published event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventScope {
    /// A single registered session.
    Session(String),
    /// Every session that joined the named room.
    Room(String),
    /// Every registered session.
    Broadcast,
}

impl EventScope {
    /// Room shared by everyone watching a project.
    #[must_use]
    pub fn project(project_id: i64) -> Self {
        Self::Room(format!("project_{project_id}"))
    }

    /// Room of every session opened by one user.
    #[must_use]
    pub fn user(user_id: i64) -> Self {
        Self::Room(format!("user_{user_id}"))
    }
}
