//! Durable store shared by every process opening the same SQLite database.
//!
//! The whole match lives in a single row as its JSON snapshot plus a
//! version counter bumped on every write. Local writers notify observers
//! directly; writes from other processes are picked up by [`SqliteStore::refresh`].

use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    Sqlite, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use territory_core::{decode_snapshot, encode_snapshot, MatchState, StatePatch};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{RawPayload, StateStore, StoreError};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// How long a writer waits for another process to release the database.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_ROW: &str = "SELECT payload, version FROM match_state WHERE id = 1";

const UPSERT_ROW: &str = "INSERT INTO match_state (id, payload, version) VALUES (1, ?1, 1) \
     ON CONFLICT(id) DO UPDATE SET payload = excluded.payload, version = match_state.version + 1 \
     RETURNING version";

/// Open (creating if needed) and migrate the database at `url`.
pub async fn init_db(url: &str) -> Result<SqlitePool, StoreError> {
    let opts = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(opts)
        .await?;
    MIGRATOR.run(&pool).await?;
    info!(url, "match database ready");
    Ok(pool)
}

/// SQLite-backed [`StateStore`].
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
    tx: watch::Sender<RawPayload>,
    seen_version: AtomicI64,
}

impl SqliteStore {
    /// Connect to `url`, seeding it with `seed` if no match is stored yet.
    pub async fn connect(url: &str, seed: &MatchState) -> Result<Self, StoreError> {
        let pool = init_db(url).await?;
        Self::with_pool(pool, seed).await
    }

    /// Private in-memory database, mostly for tests and dry runs.
    pub async fn in_memory(seed: &MatchState) -> Result<Self, StoreError> {
        // One connection that never expires, or the database vanishes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool, seed).await
    }

    /// Build on an existing pool, migrating it first.
    pub async fn with_pool(pool: SqlitePool, seed: &MatchState) -> Result<Self, StoreError> {
        MIGRATOR.run(&pool).await?;
        let seed_text = encode_snapshot(seed)?;
        sqlx::query("INSERT OR IGNORE INTO match_state (id, payload, version) VALUES (1, ?1, 0)")
            .bind(&seed_text)
            .execute(&pool)
            .await?;
        let (payload, version): (String, i64) =
            sqlx::query_as(SELECT_ROW).fetch_one(&pool).await?;
        let (tx, _rx) = watch::channel(Some(Arc::from(payload)));
        Ok(Self {
            pool,
            tx,
            seen_version: AtomicI64::new(version),
        })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Push the stored snapshot if another process changed it since we
    /// last looked. Returns whether observers were notified.
    pub async fn refresh(&self) -> Result<bool, StoreError> {
        let row: Option<(String, i64)> = sqlx::query_as(SELECT_ROW)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some((payload, version)) => self.publish(version, payload),
            None => false,
        })
    }

    /// Poll [`Self::refresh`] every `every` until `shutdown` flips to true
    /// or its sender is dropped.
    pub fn spawn_poller(
        self: Arc<Self>,
        every: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.refresh().await {
                            warn!(error = %e, "store refresh failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("store poller stopped");
        })
    }

    fn publish(&self, version: i64, payload: String) -> bool {
        let prev = self.seen_version.fetch_max(version, Ordering::SeqCst);
        if version <= prev {
            return false;
        }
        self.tx.send_replace(Some(Arc::from(payload)));
        true
    }

    /// Read, merge, and upsert inside an already open write transaction.
    async fn merge_locked(
        &self,
        conn: &mut PoolConnection<Sqlite>,
        patch: &StatePatch,
    ) -> Result<(i64, String), StoreError> {
        let row: Option<(String, i64)> = sqlx::query_as(SELECT_ROW)
            .fetch_optional(&mut **conn)
            .await?;
        let mut state = match row {
            Some((payload, _)) => match decode_snapshot(&payload) {
                Ok(state) => state,
                Err(e) => match self.last_published() {
                    Some(state) => {
                        warn!(error = %e, "stored snapshot unreadable, merging onto last published");
                        state
                    }
                    None => {
                        warn!(error = %e, "stored snapshot unreadable, merges blocked until reset");
                        return Err(e.into());
                    }
                },
            },
            None => MatchState::default(),
        };
        patch.apply_to(&mut state);
        let text = encode_snapshot(&state)?;
        let version: i64 = sqlx::query_scalar(UPSERT_ROW)
            .bind(&text)
            .fetch_one(&mut **conn)
            .await?;
        Ok((version, text))
    }

    /// Last payload pushed to observers, if it is a valid snapshot.
    fn last_published(&self) -> Option<MatchState> {
        let payload = self.tx.borrow().clone()?;
        decode_snapshot(&payload).ok()
    }

    async fn store(&self, state: &MatchState) -> Result<(), StoreError> {
        let text = encode_snapshot(state)?;
        let version: i64 = sqlx::query_scalar(UPSERT_ROW)
            .bind(&text)
            .fetch_one(&self.pool)
            .await?;
        self.publish(version, text);
        Ok(())
    }
}

impl StateStore for SqliteStore {
    fn subscribe(&self) -> watch::Receiver<RawPayload> {
        self.tx.subscribe()
    }

    async fn write(&self, patch: StatePatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.acquire().await?;
        // Take the write lock before reading so concurrent merges queue on
        // the busy timeout instead of failing a read-to-write upgrade.
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        match self.merge_locked(&mut conn, &patch).await {
            Ok((version, text)) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                self.publish(version, text);
                Ok(())
            }
            Err(e) => {
                if let Err(rb) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    warn!(error = %rb, "rollback after failed merge");
                }
                Err(e)
            }
        }
    }

    async fn replace(&self, state: MatchState) -> Result<(), StoreError> {
        self.store(&state).await
    }
}
