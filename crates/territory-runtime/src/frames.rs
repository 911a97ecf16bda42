//! Background display loop.

use std::time::Duration;

use territory_core::MatchState;
use territory_store::StateStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::GameClient;
use crate::sync::FeedEvent;

/// Handle to a running frame loop.
#[derive(Debug)]
pub struct FrameLoop {
    /// Latest interpolated state, refreshed every frame.
    pub display: watch::Receiver<MatchState>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl FrameLoop {
    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "frame loop panicked");
        }
    }
}

/// Spawn the loop that re-bases on store pushes and redraws every
/// `frame_interval_ms`.
///
/// With `auto_capture` set, holders reaching the capture score are
/// captured from this loop.
pub fn spawn_frame_loop<S>(client: GameClient<S>) -> FrameLoop
where
    S: StateStore + 'static,
{
    let (display_tx, display) = watch::channel(MatchState::default());
    let (shutdown, mut stop_rx) = watch::channel(false);
    let every = Duration::from_millis(client.config().frame_interval_ms.max(1));
    let auto_capture = client.config().auto_capture;

    let handle = tokio::spawn(async move {
        let mut feed = client.feed();
        if let FeedEvent::Snapshot(state) = feed.latest() {
            client.rebase(state).await;
        }
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(every_ms = every.as_millis() as u64, auto_capture, "frame loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let (state, ready) = client.frame().await;
                    display_tx.send_replace(state);
                    if auto_capture && !ready.is_empty() {
                        client.capture_ready(&ready).await;
                    }
                }
                event = feed.recv() => match event {
                    Some(FeedEvent::Snapshot(state)) => client.rebase(state).await,
                    Some(FeedEvent::Ignored) => debug!("kept prior snapshot"),
                    None => {
                        warn!("store closed");
                        break;
                    }
                },
                _ = stop_rx.changed() => break,
            }
        }
        info!("frame loop stopped");
    });

    FrameLoop {
        display,
        shutdown,
        handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{ManualClock, TimeSource};
    use std::sync::Arc;
    use territory_core::{GameConfig, Interaction, MatchStatus, Owner, Team};
    use territory_store::MemoryStore;

    fn fast_config(auto_capture: bool) -> GameConfig {
        GameConfig {
            frame_interval_ms: 5,
            auto_capture,
            ..GameConfig::default()
        }
    }

    async fn wait_for<F>(rx: &mut watch::Receiver<MatchState>, mut done: F) -> MatchState
    where
        F: FnMut(&MatchState) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if done(&rx.borrow_and_update()) {
                    return rx.borrow().clone();
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn display_follows_other_clients() {
        let clock = Arc::new(ManualClock::new(0));
        let time: Arc<dyn TimeSource> = clock.clone();
        let store = Arc::new(MemoryStore::default());
        let viewer = GameClient::new(store.clone(), time.clone(), fast_config(false));
        let console = GameClient::new(store.clone(), time, fast_config(false));

        let mut frames = spawn_frame_loop(viewer);
        console.start_game(None).await;
        console
            .signal_interaction("base_2", Interaction::Start, Team::Green)
            .await;
        clock.advance(1_000);

        let shown = wait_for(&mut frames.display, |s| {
            s.status == MatchStatus::Playing && s.bases["base_2"].scores.green > 34.9
        })
        .await;
        assert_eq!(shown.bases["base_2"].held_by, Some(Team::Green));
        frames.shutdown().await;
    }

    #[tokio::test]
    async fn auto_capture_claims_full_bases() {
        let clock = Arc::new(ManualClock::new(0));
        let time: Arc<dyn TimeSource> = clock.clone();
        let store = Arc::new(MemoryStore::default());
        let client = GameClient::new(store.clone(), time, fast_config(true));

        client.start_game(None).await;
        client
            .signal_interaction("base_1", Interaction::Start, Team::Red)
            .await;
        let mut frames = spawn_frame_loop(client);
        clock.advance(8_000);

        let shown = wait_for(&mut frames.display, |s| {
            s.bases["base_1"].owner == Owner::Team(Team::Red)
        })
        .await;
        assert_eq!(shown.bases["base_1"].held_by, None);
        frames.shutdown().await;
        assert_eq!(
            store.snapshot().await.bases["base_1"].owner,
            Owner::Team(Team::Red)
        );
    }
}
