#![deny(warnings)]

//! Client-side runtime for a territory match.
//!
//! Wraps a [`territory_store::StateStore`] with optimistic prediction and a
//! frame loop that re-interpolates held bases from the last raw snapshot.

pub mod client;
pub mod frames;
pub mod overlay;
pub mod reconcile;
pub mod sync;
pub mod time;

pub use client::GameClient;
pub use frames::{spawn_frame_loop, FrameLoop};
pub use overlay::PendingOverlay;
pub use reconcile::Reconciler;
pub use sync::{decode_payload, FeedEvent, SnapshotFeed};
pub use time::{ManualClock, SystemClock, TimeSource};
