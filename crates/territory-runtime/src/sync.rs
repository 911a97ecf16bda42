//! Decoding side of the store subscription.

use territory_core::{decode_snapshot, MatchState};
use territory_store::RawPayload;
use tokio::sync::watch;
use tracing::warn;

/// Outcome of one store push.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    /// A valid snapshot to re-base on.
    Snapshot(MatchState),
    /// Absent or malformed payload; keep the prior state.
    Ignored,
}

/// Turns raw store pushes into validated snapshots.
#[derive(Debug)]
pub struct SnapshotFeed {
    rx: watch::Receiver<RawPayload>,
}

impl SnapshotFeed {
    /// Wrap a store subscription.
    pub fn new(rx: watch::Receiver<RawPayload>) -> Self {
        Self { rx }
    }

    /// Decode the payload currently held, marking it seen.
    pub fn latest(&mut self) -> FeedEvent {
        let payload = self.rx.borrow_and_update().clone();
        decode_payload(payload)
    }

    /// Wait for the next push; `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        self.rx.changed().await.ok()?;
        Some(self.latest())
    }
}

/// Decode a raw payload, logging and ignoring anything unusable.
pub fn decode_payload(payload: RawPayload) -> FeedEvent {
    let Some(text) = payload else {
        return FeedEvent::Ignored;
    };
    match decode_snapshot(&text) {
        Ok(state) => FeedEvent::Snapshot(state),
        Err(e) => {
            warn!(error = %e, "ignoring snapshot");
            FeedEvent::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use territory_core::encode_snapshot;

    #[tokio::test]
    async fn decodes_valid_and_ignores_garbage() {
        let state = MatchState::default();
        let (tx, rx) = watch::channel::<RawPayload>(None);
        let mut feed = SnapshotFeed::new(rx);
        assert_eq!(feed.latest(), FeedEvent::Ignored);

        tx.send_replace(Some(Arc::from("[1, 2")));
        assert_eq!(feed.recv().await, Some(FeedEvent::Ignored));

        let text = encode_snapshot(&state).unwrap();
        tx.send_replace(Some(Arc::from(text)));
        assert_eq!(feed.recv().await, Some(FeedEvent::Snapshot(state)));

        drop(tx);
        assert_eq!(feed.recv().await, None);
    }
}
