use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Command rejection taxonomy for the sync protocol. Every variant is a
/// synchronous, no-mutation rejection; callers decide whether to retry
/// based on the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Error)]
#[ts(export)]
pub enum CommandError {
    /// Malformed command. Do not retry as-is.
    #[error("invalid command: {reason}")]
    Validation { reason: String },

    #[error("game {game_id} not found")]
    GameNotFound { game_id: String },

    #[error("player {player_id} has no seat in this game")]
    SeatNotFound { player_id: String },

    /// Command conflicts with current game state (duplicate move, join on a
    /// full game, start without enough ready seats). Do not retry as-is.
    #[error("{reason}")]
    Conflict { reason: String },

    /// Client acted against a round that has already advanced; re-fetch the
    /// snapshot and re-evaluate.
    #[error("round {submitted} is stale, current round is {current}")]
    StaleRound { submitted: u32, current: u32 },

    /// Transient; back off and retry on the next poll cycle.
    #[error("rate limited")]
    RateLimited,
}

impl CommandError {
    pub fn validation(reason: impl Into<String>) -> Self {
        CommandError::Validation {
            reason: reason.into(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        CommandError::Conflict {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for protocol responses.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::Validation { .. } => "validation",
            CommandError::GameNotFound { .. } => "game_not_found",
            CommandError::SeatNotFound { .. } => "seat_not_found",
            CommandError::Conflict { .. } => "conflict",
            CommandError::StaleRound { .. } => "stale_round",
            CommandError::RateLimited => "rate_limited",
        }
    }
}
