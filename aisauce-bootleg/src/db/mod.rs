//! Database access for the bootleg downloader
//!
//! Downloads and their tracks are kept in a local SQLite file.

pub mod downloads;

pub use downloads::{list_downloads, load_download, save_download, DownloadStore};

use aisauce_common::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool and create tables
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect(&db_url)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS downloads (
            id TEXT PRIMARY KEY,
            urls TEXT NOT NULL,
            title TEXT NOT NULL,
            status TEXT NOT NULL,
            total_tracks INTEGER NOT NULL DEFAULT 0,
            finished_tracks INTEGER NOT NULL DEFAULT 0,
            callback_url TEXT,
            created_at TEXT NOT NULL,
            ended_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            id TEXT PRIMARY KEY,
            download_id TEXT NOT NULL REFERENCES downloads(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            url TEXT NOT NULL,
            title TEXT,
            path TEXT,
            size TEXT,
            status TEXT NOT NULL,
            error TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tracks_download ON tracks(download_id, position)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (downloads, tracks)");

    Ok(())
}
