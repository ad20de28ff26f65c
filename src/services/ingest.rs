use crate::entities::{FileRecord, UploadMetadata};
use crate::error::TransferError;
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// hasura-storage reports a duplicate insert with this Postgres constraint
/// message inside its error payload. Matched once, here, so everything
/// downstream works with `TransferErrorKind` instead of message text.
const UNIQUE_VIOLATION_MARKERS: [&str; 2] = [
    "Uniqueness violation",
    "duplicate key value violates unique constraint",
];

/// Pushes one file into the destination deployment.
#[async_trait]
pub trait IngestService: Send + Sync {
    /// Download the file content from `download_url` and push it to the
    /// destination together with its repackaged metadata.
    async fn transfer(&self, download_url: &str, record: &FileRecord)
    -> Result<(), TransferError>;
}

/// Ingest client for the destination's hasura-storage `/files` endpoint.
///
/// The source download stream is wrapped directly into the multipart upload
/// body, so memory use stays bounded regardless of file size.
pub struct HttpIngest {
    http: reqwest::Client,
    storage_url: String,
    admin_secret: String,
}

impl HttpIngest {
    pub fn new(http: reqwest::Client, storage_url: String, admin_secret: String) -> Self {
        Self {
            http,
            storage_url,
            admin_secret,
        }
    }
}

#[async_trait]
impl IngestService for HttpIngest {
    async fn transfer(
        &self,
        download_url: &str,
        record: &FileRecord,
    ) -> Result<(), TransferError> {
        let download = self
            .http
            .get(download_url)
            .send()
            .await
            .map_err(|e| TransferError::transient(format!("download failed: {}", e)))?;

        let status = download.status();
        if !status.is_success() {
            // Covers expired presigned handles; the next attempt gets a fresh one.
            return Err(TransferError::transient(format!(
                "download of {} returned {}",
                record.id, status
            )));
        }

        debug!("⬇️  Streaming {} ({} bytes)", record.name, record.size);

        let stream = download.bytes_stream().map_err(std::io::Error::other);
        let body = reqwest::Body::wrap_stream(stream);
        let file_part = Part::stream_with_length(body, record.size.max(0) as u64)
            .file_name(record.name.clone())
            .mime_str(&record.mime_type)
            .map_err(|e| {
                TransferError::application(format!(
                    "invalid mime type {:?} on file {}: {}",
                    record.mime_type, record.id, e
                ))
            })?;

        let metadata = UploadMetadata::from(record);
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| TransferError::application(format!("metadata serialization: {}", e)))?;
        let metadata_part = Part::text(metadata_json)
            .mime_str("application/json")
            .map_err(|e| TransferError::transient(e.to_string()))?;

        let form = Form::new()
            .part("file[]", file_part)
            .part("metadata[]", metadata_part)
            .text("bucket-id", record.bucket_id.clone());

        let response = self
            .http
            .post(format!("{}/files", self.storage_url))
            .header("x-hasura-admin-secret", &self.admin_secret)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransferError::transient(format!("upload failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_destination_response(status, &body))
    }
}

/// Turn a non-success destination response into a classified transfer error.
fn classify_destination_response(status: StatusCode, body: &str) -> TransferError {
    let message = extract_error_message(body).unwrap_or_else(|| body.trim().to_string());

    if UNIQUE_VIOLATION_MARKERS.iter().any(|m| message.contains(m)) {
        return TransferError::duplicate(message);
    }

    if status.is_server_error() {
        TransferError::transient(format!("destination returned {}: {}", status, message))
    } else {
        TransferError::application(format!("destination returned {}: {}", status, message))
    }
}

/// hasura-storage wraps errors as `{"error": {"message": ...}}`; older
/// versions use a flat `{"message": ...}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}
