//! Per-frame re-interpolation of held bases.
//!
//! The reconciler keeps the last raw snapshot and the pending overlay as
//! ECS resources and runs a single-threaded schedule once per display frame.
//! Every frame recomputes held bases from the raw snapshot, never from the
//! previous frame's output, so drift cannot compound.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use territory_core::{capture_candidate, Base, MatchState, ScoreEngine, StatePatch, Team};

use crate::overlay::PendingOverlay;

/// Last snapshot received from the store.
#[derive(Resource, Clone, Debug, Default)]
pub struct RawSnapshot(pub MatchState);

/// Instant of the frame being computed, epoch ms.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct FrameInstant(pub i64);

/// Drain model used for interpolation.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct DrainModel(pub ScoreEngine);

/// Display-only state produced by the last frame.
#[derive(Resource, Clone, Debug, Default)]
pub struct DisplayState(pub MatchState);

/// Held bases whose holder reached the capture score in the last frame.
#[derive(Resource, Clone, Debug, Default)]
pub struct CaptureCandidates(pub Vec<(String, Team)>);

/// Settle every held base at the frame instant.
pub fn interpolate_bases(
    raw: Res<RawSnapshot>,
    pending: Res<PendingOverlay>,
    now: Res<FrameInstant>,
    drain: Res<DrainModel>,
    mut display: ResMut<DisplayState>,
) {
    let mut state = pending.apply(&raw.0);
    for base in state.bases.values_mut() {
        if base.held_by.is_some() {
            base.scores = drain.0.settle(base, now.0);
        }
    }
    display.0 = state;
}

/// Collect bases ready to be captured.
pub fn detect_captures(display: Res<DisplayState>, mut found: ResMut<CaptureCandidates>) {
    found.0 = display
        .0
        .bases
        .values()
        .filter_map(|b| capture_candidate(b).map(|t| (b.id.clone(), t)))
        .collect();
}

/// Raw snapshot, overlay, and the frame schedule.
pub struct Reconciler {
    world: World,
    schedule: Schedule,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("raw", self.raw())
            .field("pending", self.world.resource::<PendingOverlay>())
            .finish()
    }
}

impl Reconciler {
    /// Reconciler starting from `initial`.
    pub fn new(initial: MatchState, engine: ScoreEngine) -> Self {
        let mut world = World::new();
        world.insert_resource(DisplayState(initial.clone()));
        world.insert_resource(RawSnapshot(initial));
        world.insert_resource(PendingOverlay::default());
        world.insert_resource(FrameInstant::default());
        world.insert_resource(DrainModel(engine));
        world.insert_resource(CaptureCandidates::default());

        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems((interpolate_bases, detect_captures).chain());
        Self { world, schedule }
    }

    /// Adopt a freshly pushed snapshot and drop all predictions.
    pub fn rebase(&mut self, snapshot: MatchState) {
        self.world.resource_mut::<RawSnapshot>().0 = snapshot;
        self.world.resource_mut::<PendingOverlay>().clear();
    }

    /// Predict a partial write issued by this client.
    pub fn predict(&mut self, patch: StatePatch) {
        self.world.resource_mut::<PendingOverlay>().push(patch);
    }

    /// Predict a full overwrite issued by this client.
    pub fn predict_replace(&mut self, state: MatchState) {
        self.world.resource_mut::<PendingOverlay>().push_replace(state);
    }

    /// Last raw snapshot, without predictions.
    pub fn raw(&self) -> &MatchState {
        &self.world.resource::<RawSnapshot>().0
    }

    /// Whether any prediction is still waiting for a snapshot.
    pub fn has_pending(&self) -> bool {
        !self.world.resource::<PendingOverlay>().is_empty()
    }

    /// Raw snapshot with predictions applied, not interpolated.
    pub fn effective(&self) -> MatchState {
        self.world
            .resource::<PendingOverlay>()
            .apply(&self.world.resource::<RawSnapshot>().0)
    }

    /// Effective copy of one base.
    pub fn base(&self, id: &str) -> Option<Base> {
        self.effective().bases.remove(id)
    }

    /// Run one frame at `now` and return the display state.
    pub fn frame(&mut self, now: i64) -> &MatchState {
        self.world.resource_mut::<FrameInstant>().0 = now;
        self.schedule.run(&mut self.world);
        &self.world.resource::<DisplayState>().0
    }

    /// Capture-ready bases found by the last frame.
    pub fn capture_candidates(&self) -> &[(String, Team)] {
        &self.world.resource::<CaptureCandidates>().0
    }
}
