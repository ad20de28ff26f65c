use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored file object as reported by a deployment's catalog.
///
/// `id` is the sole key used for cross-deployment matching; every other
/// field is payload. Field names are camelCase on the wire to match the
/// GraphQL catalog shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub bucket_id: String,
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    pub etag: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_uploaded: bool,
    #[serde(default)]
    pub uploaded_by_user_id: Option<String>,
    /// Free-form metadata object attached by the application, if any.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// The metadata document embedded in the ingestion request.
///
/// A fixed projection of [`FileRecord`]: bucket id and the upload flag are
/// deliberately absent — the bucket travels as its own form field, and the
/// destination sets its own upload state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub size: i64,
    pub mime_type: String,
    pub etag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_by_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl From<&FileRecord> for UploadMetadata {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            size: record.size,
            mime_type: record.mime_type.clone(),
            etag: record.etag.clone(),
            uploaded_by_user_id: record.uploaded_by_user_id.clone(),
            metadata: record.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> FileRecord {
        FileRecord {
            id: "f1".to_string(),
            bucket_id: "default".to_string(),
            name: "report.pdf".to_string(),
            size: 2048,
            mime_type: "application/pdf".to_string(),
            etag: "\"abc123\"".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            is_uploaded: true,
            uploaded_by_user_id: Some("u1".to_string()),
            metadata: Some(serde_json::json!({"folder": "/reports"})),
        }
    }

    #[test]
    fn test_upload_metadata_excludes_bucket_and_upload_flag() {
        let record = sample_record();
        let meta = UploadMetadata::from(&record);
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["id"], "f1");
        assert_eq!(json["mimeType"], "application/pdf");
        assert_eq!(json["uploadedByUserId"], "u1");
        assert!(json.get("bucketId").is_none());
        assert!(json.get("isUploaded").is_none());
    }

    #[test]
    fn test_record_deserializes_camel_case() {
        let raw = r#"{
            "id": "a",
            "bucketId": "default",
            "name": "x.txt",
            "size": 3,
            "mimeType": "text/plain",
            "etag": "\"e\"",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z",
            "isUploaded": true,
            "uploadedByUserId": null,
            "metadata": null
        }"#;
        let record: FileRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.id, "a");
        assert_eq!(record.bucket_id, "default");
        assert!(record.is_uploaded);
        assert!(record.uploaded_by_user_id.is_none());
    }
}
