//! Match clock transitions and timer display helpers.
//!
//! Transitions are expressed as [`StatePatch`]es so callers can push them
//! to a store without clobbering base state. Reset is the exception: it
//! produces a whole new [`MatchState`].

use tracing::{debug, info};

use crate::model::{MatchState, MatchStatus, StatePatch};

/// Default match length in minutes.
pub const DEFAULT_DURATION_MINUTES: u32 = 15;

const MS_PER_MINUTE: i64 = 60_000;

/// Match length in milliseconds.
pub fn duration_ms(minutes: u32) -> i64 {
    i64::from(minutes) * MS_PER_MINUTE
}

/// Start or resume the match.
///
/// A paused match with recorded time left resumes with that time; anything
/// else starts fresh with `duration_minutes`.
pub fn start(state: &MatchState, now: i64, duration_minutes: u32) -> StatePatch {
    match (state.status, state.remaining_time) {
        (MatchStatus::Paused, Some(left)) if left > 0 => {
            info!(remaining_ms = left, "resuming match");
            StatePatch {
                status: Some(MatchStatus::Playing),
                end_time: Some(now.saturating_add(left)),
                remaining_time: Some(None),
                ..StatePatch::default()
            }
        }
        _ => {
            info!(duration_minutes, "starting match");
            StatePatch {
                status: Some(MatchStatus::Playing),
                end_time: Some(now.saturating_add(duration_ms(duration_minutes))),
                remaining_time: Some(None),
                ..StatePatch::default()
            }
        }
    }
}

/// Freeze the clock; `None` unless currently playing.
pub fn pause(state: &MatchState, now: i64) -> Option<StatePatch> {
    if state.status != MatchStatus::Playing {
        debug!(status = ?state.status, "pause ignored");
        return None;
    }
    let left = state.end_time.saturating_sub(now).max(0);
    info!(remaining_ms = left, "pausing match");
    Some(StatePatch {
        status: Some(MatchStatus::Paused),
        remaining_time: Some(Some(left)),
        ..StatePatch::default()
    })
}

/// End the match. Bases are left as they are.
pub fn stop() -> StatePatch {
    info!("stopping match");
    StatePatch {
        status: Some(MatchStatus::Ended),
        remaining_time: Some(None),
        ..StatePatch::default()
    }
}

/// Fresh idle match with neutral bases.
///
/// `end_time` is a placeholder; the next [`start`] overwrites it.
pub fn reset<I, S>(base_ids: I, now: i64, duration_minutes: u32) -> MatchState
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    info!(duration_minutes, "resetting match");
    MatchState::initial(base_ids, now.saturating_add(duration_ms(duration_minutes)))
}

/// Milliseconds left on the clock, or `None` when idle or ended.
///
/// Hitting zero is only a display fact; the status does not change.
pub fn time_left(state: &MatchState, now: i64) -> Option<i64> {
    match state.status {
        MatchStatus::Playing => Some(state.end_time.saturating_sub(now).max(0)),
        MatchStatus::Paused => state.remaining_time.map(|ms| ms.max(0)),
        MatchStatus::Idle | MatchStatus::Ended => None,
    }
}

/// Format milliseconds as `MM:SS`, flooring partial seconds.
pub fn format_clock(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Clock text shown on the console; idle/ended shows the full duration.
pub fn clock_label(state: &MatchState, now: i64, duration_minutes: u32) -> String {
    format_clock(time_left(state, now).unwrap_or_else(|| duration_ms(duration_minutes)))
}

/// Percentage of the match duration still left, in [0, 100].
pub fn timer_progress(state: &MatchState, now: i64, duration_minutes: u32) -> f64 {
    let total = duration_ms(duration_minutes);
    match time_left(state, now) {
        Some(_) if total <= 0 => 0.0,
        Some(left) => (left as f64 / total as f64 * 100.0).clamp(0.0, 100.0),
        None => 100.0,
    }
}
