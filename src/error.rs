//! Error types for arete.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("stat {stat} is not ready to level up ({total_xp}/{required} XP)")]
    NotReadyForLevelUp {
        stat: String,
        total_xp: u64,
        required: u64,
    },

    #[error("level {level} is inconsistent with {total_xp} total XP")]
    InconsistentProgression { level: u32, total_xp: u64 },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("content generation failed: {0}")]
    Llm(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
