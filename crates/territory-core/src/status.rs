//! Console labels for a base and capture threshold detection.

use serde::Serialize;
use std::fmt;

use crate::model::Base;
use crate::team::{Owner, Team};

/// A leader must exceed an even split by this much to be shown.
pub const LEAD_THRESHOLD: f64 = 25.1;

/// Holder score at which a capture may be issued.
pub const CAPTURE_SCORE: f64 = 100.0;

const CAPTURE_EPS: f64 = 1e-6;

/// What the admin console shows for a base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "team", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaseStatus {
    /// A team is holding the base right now.
    Contested(Team),
    /// Owned and at full score.
    Secured(Team),
    /// A team leads beyond the even split.
    Leading(Team),
    /// No meaningful lead.
    Neutral,
}

impl fmt::Display for BaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseStatus::Contested(t) => write!(f, "CONTESTED BY {}", t.as_str().to_uppercase()),
            BaseStatus::Secured(t) => write!(f, "{} SECURED", t.as_str().to_uppercase()),
            BaseStatus::Leading(t) => write!(f, "{} TEAM", t.as_str().to_uppercase()),
            BaseStatus::Neutral => f.write_str("NEUTRAL ZONE"),
        }
    }
}

/// Derive the console label for `base` from its (display) snapshot.
pub fn base_status(base: &Base) -> BaseStatus {
    if let Some(holder) = base.held_by {
        return BaseStatus::Contested(holder);
    }
    let (leader, score) = base.scores.leader();
    if let Owner::Team(owner) = base.owner {
        if score >= CAPTURE_SCORE {
            return BaseStatus::Secured(owner);
        }
    }
    if score > LEAD_THRESHOLD {
        BaseStatus::Leading(leader)
    } else {
        BaseStatus::Neutral
    }
}

/// The holder, if it has reached the capture score on a neutral base.
///
/// Only a hint: whether to actually capture stays with the caller.
pub fn capture_candidate(base: &Base) -> Option<Team> {
    let holder = base.held_by?;
    if !base.owner.is_neutral() {
        return None;
    }
    (base.scores[holder] >= CAPTURE_SCORE - CAPTURE_EPS).then_some(holder)
}
