//! Ephemeral single-process store.

use std::sync::Arc;

use territory_core::{decode_snapshot, encode_snapshot, MatchState, StatePatch};
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::{RawPayload, StateStore, StoreError};

/// In-memory store; observers in the same process are notified through a
/// watch channel on every change.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MatchState>,
    tx: watch::Sender<RawPayload>,
}

impl MemoryStore {
    /// Store seeded with `initial`.
    pub fn new(initial: MatchState) -> Self {
        let payload = encode_snapshot(&initial).ok().map(Arc::from);
        let (tx, _rx) = watch::channel(payload);
        Self {
            state: Mutex::new(initial),
            tx,
        }
    }

    /// Copy of the stored state.
    pub async fn snapshot(&self) -> MatchState {
        self.state.lock().await.clone()
    }

    /// Deliver a payload written by another same-host writer.
    ///
    /// A decodable payload becomes the stored state; either way observers
    /// receive the raw text and decide for themselves whether to keep it.
    pub async fn inject_raw(&self, text: &str) {
        match decode_snapshot(text) {
            Ok(state) => *self.state.lock().await = state,
            Err(e) => debug!(error = %e, "foreign payload not adopted"),
        }
        self.tx.send_replace(Some(Arc::from(text)));
    }

    fn publish(&self, state: &MatchState) -> Result<(), StoreError> {
        let text = encode_snapshot(state)?;
        self.tx.send_replace(Some(Arc::from(text)));
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MatchState::default())
    }
}

impl StateStore for MemoryStore {
    fn subscribe(&self) -> watch::Receiver<RawPayload> {
        self.tx.subscribe()
    }

    async fn write(&self, patch: StatePatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        patch.apply_to(&mut next);
        if let Err(e) = self.publish(&next) {
            warn!(error = %e, "memory store write dropped");
            return Err(e);
        }
        *guard = next;
        Ok(())
    }

    async fn replace(&self, state: MatchState) -> Result<(), StoreError> {
        let mut guard = self.state.lock().await;
        self.publish(&state)?;
        *guard = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use territory_core::{MatchStatus, Team};

    fn decode(rx: &watch::Receiver<RawPayload>) -> MatchState {
        let payload = rx.borrow().clone().unwrap();
        decode_snapshot(&payload).unwrap()
    }

    #[tokio::test]
    async fn subscribers_see_initial_and_merged_state() {
        let store = MemoryStore::default();
        let rx = store.subscribe();
        assert_eq!(decode(&rx), MatchState::default());

        let mut b2 = store.snapshot().await.bases["base_2"].clone();
        b2.held_by = Some(Team::Green);
        b2.last_interaction = 10;
        let mut patch = StatePatch::for_base(b2.clone());
        patch.status = Some(MatchStatus::Playing);
        store.write(patch).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let seen = decode(&rx);
        assert_eq!(seen.status, MatchStatus::Playing);
        assert_eq!(seen.bases["base_2"], b2);
        assert_eq!(seen.bases["base_1"], MatchState::default().bases["base_1"]);
        assert_eq!(store.snapshot().await, seen);
    }

    #[tokio::test]
    async fn empty_patch_does_not_notify() {
        let store = MemoryStore::default();
        let rx = store.subscribe();
        store.write(StatePatch::default()).await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn replace_overwrites_everything() {
        let store = MemoryStore::default();
        let fresh = MatchState::initial(["north"], 5);
        store.replace(fresh.clone()).await.unwrap();
        assert_eq!(store.snapshot().await, fresh);
        let payload = store.current().unwrap();
        assert_eq!(decode_snapshot(&payload).unwrap(), fresh);
    }

    #[tokio::test]
    async fn foreign_garbage_is_forwarded_but_not_adopted() {
        let store = MemoryStore::default();
        let rx = store.subscribe();
        store.inject_raw("{\"status\":").await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow().as_deref(), Some("{\"status\":"));
        assert_eq!(store.snapshot().await, MatchState::default());

        let mut other = MatchState::default();
        other.status = MatchStatus::Ended;
        store.inject_raw(&encode_snapshot(&other).unwrap()).await;
        assert_eq!(store.snapshot().await.status, MatchStatus::Ended);
    }
}
