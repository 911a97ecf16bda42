//! Bases, match state, partial updates, and the JSON snapshot codec.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::team::{Owner, Scores, Team};
use crate::{SnapshotError, ValidationError};

/// Allowed drift of a score distribution's sum away from 100.
pub const SCORE_SUM_TOLERANCE: f64 = 1e-6;

/// Slack allowed on the [0, 100] range for accumulated float error.
const RANGE_SLACK: f64 = 1e-9;

/// A contested zone and its last recorded snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Base {
    /// Base identifier, e.g. "base_1".
    pub id: String,
    /// Capturing team, or neutral.
    pub owner: Owner,
    /// Team currently holding the base, if any.
    pub held_by: Option<Team>,
    /// Milliseconds since the Unix epoch of the last settled interaction.
    #[serde(rename = "lastInteractionTimestamp")]
    pub last_interaction: i64,
    /// Score split as of `last_interaction`.
    pub scores: Scores,
}

impl Base {
    /// A fresh neutral base with an equal split.
    pub fn neutral(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: Owner::Neutral,
            held_by: None,
            last_interaction: 0,
            scores: Scores::equal_split(),
        }
    }
}

/// Match-wide clock status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// Reset, waiting for the first start.
    #[default]
    Idle,
    /// Clock running, bases evolve.
    Playing,
    /// Clock frozen with a recorded remaining time.
    Paused,
    /// Stopped by the admin.
    Ended,
}

/// Full shared state of a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    /// Clock status.
    pub status: MatchStatus,
    /// Scheduled end instant in epoch milliseconds; meaningful while playing.
    pub end_time: i64,
    /// Time left captured at pause; present iff paused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<i64>,
    /// All bases keyed by id.
    pub bases: BTreeMap<String, Base>,
}

impl MatchState {
    /// Idle state with neutral bases for every id.
    pub fn initial<I, S>(base_ids: I, end_time: i64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            status: MatchStatus::Idle,
            end_time,
            remaining_time: None,
            bases: initial_bases(base_ids),
        }
    }

    /// Whether any base currently has a holder.
    pub fn any_held(&self) -> bool {
        self.bases.values().any(|b| b.held_by.is_some())
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::initial(crate::config::default_base_ids(), 0)
    }
}

/// Neutral bases keyed by id.
pub fn initial_bases<I, S>(ids: I) -> BTreeMap<String, Base>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter()
        .map(|id| {
            let base = Base::neutral(id);
            (base.id.clone(), base)
        })
        .collect()
}

/// Partial update merged into a stored [`MatchState`].
///
/// Unset top-level fields are left alone and only the listed bases are
/// replaced; other bases are never touched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatePatch {
    /// New status.
    pub status: Option<MatchStatus>,
    /// New scheduled end instant.
    pub end_time: Option<i64>,
    /// `Some(None)` clears the remaining time, `Some(Some(ms))` sets it.
    pub remaining_time: Option<Option<i64>>,
    /// Per-base replacements.
    pub bases: BTreeMap<String, Base>,
}

impl StatePatch {
    /// Patch touching exactly one base.
    pub fn for_base(base: Base) -> Self {
        let mut bases = BTreeMap::new();
        bases.insert(base.id.clone(), base);
        Self {
            bases,
            ..Self::default()
        }
    }

    /// True when applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.end_time.is_none()
            && self.remaining_time.is_none()
            && self.bases.is_empty()
    }

    /// Fold a later patch into this one; later fields win.
    pub fn merge(&mut self, later: StatePatch) {
        if later.status.is_some() {
            self.status = later.status;
        }
        if later.end_time.is_some() {
            self.end_time = later.end_time;
        }
        if later.remaining_time.is_some() {
            self.remaining_time = later.remaining_time;
        }
        self.bases.extend(later.bases);
    }

    /// Merge into `state` in place.
    pub fn apply_to(&self, state: &mut MatchState) {
        if let Some(status) = self.status {
            state.status = status;
        }
        if let Some(end) = self.end_time {
            state.end_time = end;
        }
        if let Some(remaining) = self.remaining_time {
            state.remaining_time = remaining;
        }
        for (id, base) in &self.bases {
            state.bases.insert(id.clone(), base.clone());
        }
    }
}

/// Check the sum and range invariants of a distribution.
pub fn validate_scores(scores: &Scores) -> Result<(), ValidationError> {
    for (team, &v) in scores.iter() {
        if !v.is_finite() {
            return Err(ValidationError::NonFinite);
        }
        if !(-RANGE_SLACK..=100.0 + RANGE_SLACK).contains(&v) {
            return Err(ValidationError::ScoreOutOfRange { team, value: v });
        }
    }
    let sum = scores.total();
    if (sum - 100.0).abs() > SCORE_SUM_TOLERANCE {
        return Err(ValidationError::ScoreSumMismatch(sum));
    }
    Ok(())
}

/// Validate a base stored under `key`.
pub fn validate_base(key: &str, base: &Base) -> Result<(), ValidationError> {
    if key != base.id {
        return Err(ValidationError::BaseIdMismatch {
            key: key.to_string(),
            id: base.id.clone(),
        });
    }
    validate_scores(&base.scores)
}

/// Validate the whole match state.
pub fn validate_match_state(state: &MatchState) -> Result<(), ValidationError> {
    let paused = state.status == MatchStatus::Paused;
    if paused != state.remaining_time.is_some() {
        return Err(ValidationError::RemainingTimeMismatch(state.status));
    }
    for (key, base) in &state.bases {
        validate_base(key, base)?;
    }
    Ok(())
}

/// Decode and validate a pushed snapshot.
pub fn decode_snapshot(payload: &str) -> Result<MatchState, SnapshotError> {
    let state: MatchState = serde_json::from_str(payload)?;
    validate_match_state(&state)?;
    Ok(state)
}

/// Encode a snapshot in its wire shape.
pub fn encode_snapshot(state: &MatchState) -> Result<String, serde_json::Error> {
    serde_json::to_string(state)
}
