//! Hold, abort, and capture transitions on a single base.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::engine::ScoreEngine;
use crate::model::Base;
use crate::team::{Owner, Team};
use crate::ValidationError;

/// Action a station issues against a base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Interaction {
    /// Begin holding; overrides any prior hold.
    Start,
    /// Release a hold owned by the same team.
    Abort,
    /// Assign permanent ownership.
    Capture,
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Interaction::Start => "START",
            Interaction::Abort => "ABORT",
            Interaction::Capture => "CAPTURE",
        })
    }
}

impl FromStr for Interaction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "START" | "HOLD" => Ok(Interaction::Start),
            "ABORT" | "RELEASE" => Ok(Interaction::Abort),
            "CAPTURE" => Ok(Interaction::Capture),
            _ => Err(ValidationError::UnknownInteraction(s.to_string())),
        }
    }
}

/// Hold/capture state of a base, derived from its fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldState {
    /// Neutral and unheld.
    NeutralIdle,
    /// Some team is holding.
    Held(Team),
    /// Owned by a team and not held.
    Captured(Team),
}

/// Classify `base` into its hold state.
pub fn hold_state(base: &Base) -> HoldState {
    match (base.held_by, base.owner) {
        (Some(t), _) => HoldState::Held(t),
        (None, Owner::Team(t)) => HoldState::Captured(t),
        (None, Owner::Neutral) => HoldState::NeutralIdle,
    }
}

/// Applies interactions, settling elapsed drain first.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseController {
    engine: ScoreEngine,
}

impl BaseController {
    /// Controller settling with `engine`.
    pub fn new(engine: ScoreEngine) -> Self {
        Self { engine }
    }

    /// The drain model used for settlement.
    pub fn engine(&self) -> &ScoreEngine {
        &self.engine
    }

    /// Next snapshot of `base` after `team` issues `action` at `now`.
    ///
    /// Returns `None` when the action is a no-op: an abort from a team that
    /// is not the current holder.
    pub fn apply(&self, base: &Base, action: Interaction, team: Team, now: i64) -> Option<Base> {
        if action == Interaction::Abort && base.held_by != Some(team) {
            debug!(base = %base.id, %team, holder = ?base.held_by, "ignoring abort from non-holder");
            return None;
        }
        let settled = self.engine.settle(base, now);
        let mut next = base.clone();
        next.scores = settled;
        next.last_interaction = now.max(base.last_interaction);
        match action {
            Interaction::Start => next.held_by = Some(team),
            Interaction::Abort => next.held_by = None,
            Interaction::Capture => {
                next.owner = Owner::Team(team);
                next.held_by = None;
            }
        }
        Some(next)
    }

    /// Begin a hold.
    pub fn start(&self, base: &Base, team: Team, now: i64) -> Base {
        self.apply(base, Interaction::Start, team, now)
            .unwrap_or_else(|| base.clone())
    }

    /// Release a hold; `None` if `team` is not the holder.
    pub fn abort(&self, base: &Base, team: Team, now: i64) -> Option<Base> {
        self.apply(base, Interaction::Abort, team, now)
    }

    /// Capture the base for `team`.
    pub fn capture(&self, base: &Base, team: Team, now: i64) -> Base {
        self.apply(base, Interaction::Capture, team, now)
            .unwrap_or_else(|| base.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::settle;
    use crate::team::Scores;

    fn ctl() -> BaseController {
        BaseController::default()
    }

    #[test]
    fn hold_then_abort_settles_drain() {
        let b = Base::neutral("base_1");
        let held = ctl().start(&b, Team::Red, 10_000);
        assert_eq!(hold_state(&held), HoldState::Held(Team::Red));
        assert_eq!(held.scores, Scores::equal_split());
        assert_eq!(held.last_interaction, 10_000);

        let released = ctl().abort(&held, Team::Red, 12_500).unwrap();
        assert_eq!(hold_state(&released), HoldState::NeutralIdle);
        assert!((released.scores.red - 50.0).abs() < 1e-6);
        assert_eq!(released.last_interaction, 12_500);
        // Released bases stay put.
        assert_eq!(settle(&released, 90_000), released.scores);
    }

    #[test]
    fn foreign_abort_is_a_noop() {
        let b = ctl().start(&Base::neutral("base_1"), Team::Blue, 1_000);
        assert!(ctl().abort(&b, Team::Red, 2_000).is_none());
        assert!(ctl().abort(&Base::neutral("base_1"), Team::Red, 2_000).is_none());
    }

    #[test]
    fn new_hold_overrides_prior_holder() {
        let b = ctl().start(&Base::neutral("base_1"), Team::Blue, 1_000);
        let b = ctl().start(&b, Team::Green, 2_000);
        assert_eq!(b.held_by, Some(Team::Green));
        assert!((b.scores.blue - 35.0).abs() < 1e-6);
    }

    #[test]
    fn capture_freezes_scores() {
        let b = ctl().start(&Base::neutral("base_1"), Team::Yellow, 0);
        let b = ctl().capture(&b, Team::Yellow, 7_500);
        assert_eq!(hold_state(&b), HoldState::Captured(Team::Yellow));
        assert!((b.scores.yellow - 100.0).abs() < 1e-6);
        let frozen = b.scores;

        let rehold = ctl().start(&b, Team::Red, 8_000);
        assert_eq!(rehold.held_by, Some(Team::Red));
        assert_eq!(rehold.scores, frozen);
        assert_eq!(settle(&rehold, 60_000), frozen);
        let recaptured = ctl().capture(&rehold, Team::Red, 60_000);
        assert_eq!(recaptured.owner, Owner::Team(Team::Red));
        assert_eq!(recaptured.scores, frozen);
    }

    #[test]
    fn timestamp_never_moves_backwards() {
        let b = ctl().start(&Base::neutral("base_1"), Team::Red, 5_000);
        let b2 = ctl().start(&b, Team::Green, 4_000);
        assert_eq!(b2.last_interaction, 5_000);
        assert_eq!(b2.scores, b.scores);
    }

    #[test]
    fn parses_action_names() {
        assert_eq!("start".parse::<Interaction>().unwrap(), Interaction::Start);
        assert_eq!("release".parse::<Interaction>().unwrap(), Interaction::Abort);
        assert!("jump".parse::<Interaction>().is_err());
    }
}
