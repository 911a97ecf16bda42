#![deny(warnings)]

use territory_core::MatchState;
use territory_store::{default_sqlite_url, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    // Ensure directory exists
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"));
    if let Some(path) = path {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    // Seeds an idle match on first run; an existing one is kept.
    let _store = SqliteStore::connect(&url, &MatchState::default()).await?;
    println!("DB migrated at {}", url);
    Ok(())
}
