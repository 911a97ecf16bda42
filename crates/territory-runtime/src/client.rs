//! Client handle used by consoles and simulator stations.
//!
//! Every action settles against the client's current view, predicts the
//! outcome locally, then writes to the store. Writes are fire-and-forget:
//! failures are logged and never reported back to the caller.

use std::sync::Arc;

use territory_core::clock;
use territory_core::{
    BaseController, GameConfig, Interaction, MatchState, MatchStatus, StatePatch, Team,
};
use territory_store::StateStore;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::reconcile::Reconciler;
use crate::sync::{decode_payload, FeedEvent, SnapshotFeed};
use crate::time::TimeSource;

/// Shared handle to a match through one store.
#[derive(Debug)]
pub struct GameClient<S> {
    store: Arc<S>,
    view: Arc<Mutex<Reconciler>>,
    time: Arc<dyn TimeSource>,
    controller: BaseController,
    config: Arc<GameConfig>,
}

impl<S> Clone for GameClient<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            view: Arc::clone(&self.view),
            time: Arc::clone(&self.time),
            controller: self.controller,
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: StateStore> GameClient<S> {
    /// Client starting from whatever the store currently holds.
    pub fn new(store: Arc<S>, time: Arc<dyn TimeSource>, config: GameConfig) -> Self {
        let initial = match decode_payload(store.current()) {
            FeedEvent::Snapshot(state) => state,
            FeedEvent::Ignored => MatchState::initial(config.base_ids.iter().cloned(), 0),
        };
        let engine = config.engine();
        Self {
            store,
            view: Arc::new(Mutex::new(Reconciler::new(initial, engine))),
            time,
            controller: BaseController::new(engine),
            config: Arc::new(config),
        }
    }

    /// Configuration this client runs with.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The store this client writes to.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Current instant from the client's time source.
    pub fn now(&self) -> i64 {
        self.time.now_ms()
    }

    /// Fresh subscription to the store.
    pub fn feed(&self) -> SnapshotFeed {
        SnapshotFeed::new(self.store.subscribe())
    }

    /// Adopt a snapshot pushed by the store.
    pub async fn rebase(&self, snapshot: MatchState) {
        self.view.lock().await.rebase(snapshot);
    }

    /// Last snapshot pushed by the store, without predictions.
    pub async fn raw(&self) -> MatchState {
        self.view.lock().await.raw().clone()
    }

    /// Raw snapshot with local predictions, before interpolation.
    pub async fn view(&self) -> MatchState {
        self.view.lock().await.effective()
    }

    /// Interpolated state for display at the current instant.
    pub async fn display(&self) -> MatchState {
        let now = self.now();
        self.view.lock().await.frame(now).clone()
    }

    /// Run one display frame, returning the state and capture-ready bases.
    pub async fn frame(&self) -> (MatchState, Vec<(String, Team)>) {
        let now = self.now();
        let mut view = self.view.lock().await;
        let display = view.frame(now).clone();
        (display, view.capture_candidates().to_vec())
    }

    /// Apply `action` by `team` on `base_id`.
    pub async fn signal_interaction(&self, base_id: &str, action: Interaction, team: Team) {
        let now = self.now();
        let patch = {
            let mut view = self.view.lock().await;
            let state = view.effective();
            if action == Interaction::Start
                && self.config.holds_require_playing
                && state.status != MatchStatus::Playing
            {
                debug!(base_id, %team, status = ?state.status, "hold ignored while clock stopped");
                return;
            }
            let Some(base) = state.bases.get(base_id) else {
                warn!(base_id, "interaction on unknown base");
                return;
            };
            let Some(next) = self.controller.apply(base, action, team, now) else {
                return;
            };
            debug!(base_id, %team, %action, "interaction");
            let patch = StatePatch::for_base(next);
            view.predict(patch.clone());
            patch
        };
        self.push(patch).await;
    }

    /// Replace the match with a fresh idle one.
    pub async fn reset_game(&self, duration_minutes: u32) {
        let now = self.now();
        let state = clock::reset(self.config.base_ids.iter().cloned(), now, duration_minutes);
        self.view.lock().await.predict_replace(state.clone());
        if let Err(e) = self.store.replace(state).await {
            warn!(error = %e, "reset not stored");
        }
    }

    /// Start, or resume from pause. `None` uses the configured duration.
    pub async fn start_game(&self, duration_minutes: Option<u32>) {
        let minutes = duration_minutes.unwrap_or(self.config.default_duration_minutes);
        let now = self.now();
        let patch = {
            let mut view = self.view.lock().await;
            let patch = clock::start(&view.effective(), now, minutes);
            view.predict(patch.clone());
            patch
        };
        self.push(patch).await;
    }

    /// Pause a running match; a no-op otherwise.
    pub async fn pause_game(&self) {
        let now = self.now();
        let patch = {
            let mut view = self.view.lock().await;
            let Some(patch) = clock::pause(&view.effective(), now) else {
                return;
            };
            view.predict(patch.clone());
            patch
        };
        self.push(patch).await;
    }

    /// End the match.
    pub async fn stop_game(&self) {
        let patch = clock::stop();
        self.view.lock().await.predict(patch.clone());
        self.push(patch).await;
    }

    async fn push(&self, patch: StatePatch) {
        if let Err(e) = self.store.write(patch).await {
            warn!(error = %e, "write dropped");
        }
    }

    /// Issue CAPTURE for every base whose holder reached 100.
    pub async fn capture_ready(&self, ready: &[(String, Team)]) {
        for (base_id, team) in ready {
            info!(base_id = %base_id, %team, "auto capture");
            self.signal_interaction(base_id, Interaction::Capture, *team)
                .await;
        }
    }
}
