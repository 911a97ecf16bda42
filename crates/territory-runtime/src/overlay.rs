//! Locally predicted changes awaiting the next authoritative snapshot.

use bevy_ecs::prelude::*;
use territory_core::{MatchState, StatePatch};

/// Optimistic changes layered over the last raw snapshot.
///
/// Set when this client issues an action; cleared as soon as any new
/// snapshot arrives, whether or not it reflects the action.
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct PendingOverlay {
    replaced: Option<MatchState>,
    patch: StatePatch,
}

impl PendingOverlay {
    /// Nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.replaced.is_none() && self.patch.is_empty()
    }

    /// Record a predicted partial write.
    pub fn push(&mut self, patch: StatePatch) {
        self.patch.merge(patch);
    }

    /// Record a predicted full overwrite; earlier partial predictions are moot.
    pub fn push_replace(&mut self, state: MatchState) {
        self.replaced = Some(state);
        self.patch = StatePatch::default();
    }

    /// Drop every prediction.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// `raw` with the predictions applied.
    pub fn apply(&self, raw: &MatchState) -> MatchState {
        let mut state = self.replaced.clone().unwrap_or_else(|| raw.clone());
        self.patch.apply_to(&mut state);
        state
    }
}
