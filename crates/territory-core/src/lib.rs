#![deny(warnings)]

//! Core domain models and invariants for the territory contest.
//!
//! This crate defines the serializable match state shared by every client,
//! the pure score-drain engine, the per-base hold/capture transitions, the
//! match clock, and display helpers. Nothing here does IO or reads the wall
//! clock; every time-dependent operation takes `now` in epoch milliseconds.

pub mod clock;
pub mod config;
pub mod controller;
pub mod engine;
pub mod model;
pub mod normalize;
pub mod status;
pub mod team;

use thiserror::Error;

pub use config::{default_base_ids, validate_config, GameConfig};
pub use controller::{hold_state, BaseController, HoldState, Interaction};
pub use engine::{settle, ScoreEngine, DRAIN_RATE_PER_SEC};
pub use model::{
    decode_snapshot, encode_snapshot, validate_base, validate_match_state, validate_scores, Base,
    MatchState, MatchStatus, StatePatch,
};
pub use normalize::{normalize, Percentages};
pub use status::{base_status, capture_candidate, BaseStatus};
pub use team::{Owner, Scores, Team, TeamMap};

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Score distribution does not add up to 100.
    #[error("scores sum to {0}, expected 100")]
    ScoreSumMismatch(f64),
    /// A single score left [0, 100].
    #[error("score for {team} out of range: {value}")]
    ScoreOutOfRange {
        /// Offending team.
        team: Team,
        /// Offending value.
        value: f64,
    },
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
    /// A base is stored under a key different from its id.
    #[error("base stored under {key:?} has id {id:?}")]
    BaseIdMismatch {
        /// Map key.
        key: String,
        /// Embedded id.
        id: String,
    },
    /// `remainingTime` must be present exactly when paused.
    #[error("remaining time presence does not match status {0:?}")]
    RemainingTimeMismatch(MatchStatus),
    /// Unrecognized team name.
    #[error("unknown team: {0}")]
    UnknownTeam(String),
    /// Unrecognized interaction name.
    #[error("unknown interaction: {0}")]
    UnknownInteraction(String),
    /// Configuration out of bounds or unparsable.
    #[error("invalid config: {0}")]
    Config(String),
}

/// Why a pushed snapshot was discarded.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Payload is not a well-formed match state.
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Payload decoded but breaks an invariant.
    #[error("invalid snapshot: {0}")]
    Invalid(#[from] ValidationError),
}
