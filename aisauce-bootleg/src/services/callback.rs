//! Completion callback
//!
//! When a download carries a callback URL, a JSON summary is POSTed to it
//! once the batch ends. Delivery is best effort: failures are logged by the
//! caller and never retried.

use crate::models::{DownloadRecord, DownloadStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

const CALLBACK_STATUS: &str = "download done";

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("Callback request to {0} failed: {1}")]
    Network(String, String),

    #[error("Callback endpoint {0} answered {1}")]
    Rejected(String, u16),
}

/// Body POSTed to the callback URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload {
    pub status: String,
    pub result: DownloadStatus,
    pub track_paths: Vec<PathBuf>,
    pub download_id: Uuid,
    pub num_tracks: usize,
}

impl CompletionPayload {
    pub fn from_record(record: &DownloadRecord) -> Self {
        Self {
            status: CALLBACK_STATUS.to_string(),
            result: record.status,
            track_paths: record.track_paths(),
            download_id: record.id,
            num_tracks: record.total_tracks,
        }
    }
}

/// POST the completion payload of `record` to `url`
pub async fn notify(
    client: &reqwest::Client,
    url: &str,
    record: &DownloadRecord,
) -> Result<(), CallbackError> {
    let payload = CompletionPayload::from_record(record);

    tracing::debug!(url = %url, download_id = %record.id, "Sending completion callback");

    let response = client
        .post(url)
        .json(&payload)
        .send()
        .await
        .map_err(|e| CallbackError::Network(url.to_string(), e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CallbackError::Rejected(url.to_string(), status.as_u16()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_uses_camel_case_keys() {
        let mut record = DownloadRecord::new("u1 u2", Some("http://cb".to_string()));
        record.start();
        let idx = record.begin_track("u1");
        record.complete_track(idx, "T".into(), PathBuf::from("/m/T.mp3"), "1 MB".into());
        let failed = record.begin_track("u2");
        record.fail_track(failed, "boom".into());
        record.finish();

        let json = serde_json::to_value(CompletionPayload::from_record(&record)).unwrap();
        assert_eq!(json["status"], "download done");
        assert_eq!(json["result"], "failed");
        assert_eq!(json["trackPaths"], serde_json::json!(["/m/T.mp3"]));
        assert_eq!(json["downloadId"], record.id.to_string());
        assert_eq!(json["numTracks"], 2);
    }
}
