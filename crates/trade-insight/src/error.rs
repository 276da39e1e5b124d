//! Error Types for Trade Insight

use thiserror::Error;

use crate::model::UserId;

pub type Result<T> = std::result::Result<T, InsightError>;

#[derive(Error, Debug)]
pub enum InsightError {
    /// A record the pipeline cannot work without is absent for a user.
    #[error("Missing {record} for user {user}")]
    MissingData {
        user: UserId,
        record: &'static str,
    },

    /// The pipeline ran but no candidate cleared the action table.
    #[error("Insufficient signal for {user}: none of {candidates} candidate assets is actionable")]
    InsufficientSignal {
        user: UserId,
        candidates: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Record source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InsightError {
    pub(crate) fn missing(user: &UserId, record: &'static str) -> Self {
        Self::MissingData {
            user: user.clone(),
            record,
        }
    }

    /// Only failures at the loader boundary are worth retrying; the pipeline
    /// itself is a pure function of its inputs.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Source(_))
    }

    pub const fn is_insufficient_signal(&self) -> bool {
        matches!(self, Self::InsufficientSignal { .. })
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingData { user, record } => {
                format!("We could not find a {record} for {user}, so no analysis was run.")
            }
            Self::InsufficientSignal { .. } => {
                "Your network shows no trend strong enough to act on right now.".into()
            }
            Self::Config(msg) => format!("The analysis is misconfigured: {msg}"),
            Self::InvalidRecord(msg) => format!("The loaded data is inconsistent: {msg}"),
            _ => "The trading data could not be loaded.".into(),
        }
    }
}
