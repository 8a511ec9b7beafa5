//! Download record persistence

use aisauce_common::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::{DownloadRecord, DownloadStatus, TrackRecord};

/// Sink for download progress
#[async_trait]
pub trait DownloadStore: Send + Sync {
    async fn save(&self, record: &DownloadRecord) -> Result<()>;
}

#[async_trait]
impl DownloadStore for SqlitePool {
    async fn save(&self, record: &DownloadRecord) -> Result<()> {
        save_download(self, record).await
    }
}

/// Upsert a download and replace its tracks
pub async fn save_download(pool: &SqlitePool, record: &DownloadRecord) -> Result<()> {
    let id = record.id.to_string();
    let urls = serde_json::to_string(&record.urls)
        .map_err(|e| Error::Internal(format!("Failed to serialize urls: {}", e)))?;
    let created_at = record.created_at.to_rfc3339();
    let ended_at = record.ended_at.map(|dt| dt.to_rfc3339());

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO downloads (
            id, urls, title, status, total_tracks, finished_tracks,
            callback_url, created_at, ended_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            status = excluded.status,
            total_tracks = excluded.total_tracks,
            finished_tracks = excluded.finished_tracks,
            ended_at = excluded.ended_at
        "#,
    )
    .bind(&id)
    .bind(&urls)
    .bind(&record.title)
    .bind(record.status.as_str())
    .bind(record.total_tracks as i64)
    .bind(record.finished_tracks as i64)
    .bind(&record.callback_url)
    .bind(&created_at)
    .bind(&ended_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM tracks WHERE download_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    for (position, track) in record.tracks.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO tracks (id, download_id, position, url, title, path, size, status, error)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(track.id.to_string())
        .bind(&id)
        .bind(position as i64)
        .bind(&track.url)
        .bind(&track.title)
        .bind(track.path.as_ref().map(|p| p.to_string_lossy().into_owned()))
        .bind(&track.size)
        .bind(track.status.as_str())
        .bind(&track.error)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Load a download with its tracks
pub async fn load_download(pool: &SqlitePool, download_id: Uuid) -> Result<Option<DownloadRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, urls, title, status, total_tracks, finished_tracks,
               callback_url, created_at, ended_at
        FROM downloads
        WHERE id = ?
        "#,
    )
    .bind(download_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let mut record = download_from_row(&row)?;
            record.tracks = load_tracks(pool, record.id).await?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}

/// Most recent downloads first
pub async fn list_downloads(pool: &SqlitePool, limit: u32) -> Result<Vec<DownloadRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, urls, title, status, total_tracks, finished_tracks,
               callback_url, created_at, ended_at
        FROM downloads
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let mut record = download_from_row(&row)?;
        record.tracks = load_tracks(pool, record.id).await?;
        records.push(record);
    }
    Ok(records)
}

async fn load_tracks(pool: &SqlitePool, download_id: Uuid) -> Result<Vec<TrackRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, url, title, path, size, status, error
        FROM tracks
        WHERE download_id = ?
        ORDER BY position
        "#,
    )
    .bind(download_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let path: Option<String> = row.get("path");
            Ok(TrackRecord {
                id: parse_uuid(row.get("id"))?,
                download_id,
                url: row.get("url"),
                title: row.get("title"),
                path: path.map(PathBuf::from),
                size: row.get("size"),
                status: parse_status(row.get("status"))?,
                error: row.get("error"),
            })
        })
        .collect()
}

fn download_from_row(row: &SqliteRow) -> Result<DownloadRecord> {
    let urls: String = row.get("urls");
    let urls: Vec<String> = serde_json::from_str(&urls)
        .map_err(|e| Error::Internal(format!("Failed to deserialize urls: {}", e)))?;

    let total_tracks: i64 = row.get("total_tracks");
    let finished_tracks: i64 = row.get("finished_tracks");
    let ended_at: Option<String> = row.get("ended_at");

    Ok(DownloadRecord {
        id: parse_uuid(row.get("id"))?,
        urls,
        title: row.get("title"),
        status: parse_status(row.get("status"))?,
        total_tracks: total_tracks as usize,
        finished_tracks: finished_tracks as usize,
        callback_url: row.get("callback_url"),
        tracks: Vec::new(),
        created_at: parse_timestamp(row.get("created_at"))?,
        ended_at: ended_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid id {}: {}", value, e)))
}

fn parse_status(value: &str) -> Result<DownloadStatus> {
    DownloadStatus::parse(value).ok_or_else(|| Error::Internal(format!("Unknown status: {}", value)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp {}: {}", value, e)))
}
