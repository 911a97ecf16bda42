#![deny(warnings)]

//! Shared match state stores.
//!
//! Clients observe the match through a push-based [`StateStore`]: every
//! change is delivered as the full JSON snapshot on a watch channel, and
//! mutations are either partial merges ([`StateStore::write`]) or full
//! overwrites ([`StateStore::replace`], used by match reset).
//!
//! Two interchangeable backends are provided:
//! - [`MemoryStore`]: ephemeral, single process.
//! - [`SqliteStore`]: durable, shared by every process opening the same file.

use std::future::Future;
use std::sync::Arc;

use territory_core::{MatchState, SnapshotError, StatePatch};
use thiserror::Error;
use tokio::sync::watch;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{init_db, SqliteStore};

/// JSON snapshot as pushed to observers; `None` when nothing is stored.
pub type RawPayload = Option<Arc<str>>;

/// Errors raised by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database access failed.
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    /// Snapshot could not be encoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
    /// Stored snapshot is unreadable, so a merge cannot proceed.
    #[error("stored snapshot rejected: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Push-based store of the shared [`MatchState`].
pub trait StateStore: Send + Sync {
    /// Register an observer; the receiver always holds the latest payload.
    fn subscribe(&self) -> watch::Receiver<RawPayload>;

    /// Merge `patch` into the stored state without touching other bases.
    fn write(&self, patch: StatePatch) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Overwrite the stored state.
    fn replace(&self, state: MatchState) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Latest payload without registering a long-lived observer.
    fn current(&self) -> RawPayload {
        let rx = self.subscribe();
        let payload = rx.borrow().clone();
        payload
    }
}

/// Returns the default SQLite URL used for the shared match database.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/match.db"
}
