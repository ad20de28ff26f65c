use thiserror::Error;

/// Errors from a deployment's catalog service (GraphQL + storage API).
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The inventory query could not complete. Fatal for the run: without a
    /// full inventory there is nothing safe to reconcile against.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// The source could not issue a presigned download URL for one file.
    /// Per-file, treated as a transient transfer failure by the caller.
    #[error("no download handle for file {file_id}: {reason}")]
    HandleUnavailable { file_id: String, reason: String },

    /// The batched delete mutation failed.
    #[error("bulk delete failed: {0}")]
    BulkDelete(String),
}

/// Classification of a single-file transfer failure, set at the point of
/// origin (the HTTP client that parses the destination's response) so that
/// the retry loop never has to inspect message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferErrorKind {
    /// Network failure, 5xx, expired or missing download handle. Retryable.
    Transient,
    /// The destination already holds a record with this id. Success-equivalent.
    DuplicateIdentity,
    /// The destination accepted the request but rejected the file
    /// semantically (validation error, quota, ...). Retrying cannot help.
    Application,
}

/// Failure of one transfer attempt.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransferError {
    pub kind: TransferErrorKind,
    pub message: String,
}

impl TransferError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: TransferErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self {
            kind: TransferErrorKind::DuplicateIdentity,
            message: message.into(),
        }
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self {
            kind: TransferErrorKind::Application,
            message: message.into(),
        }
    }
}

impl From<CatalogError> for TransferError {
    fn from(err: CatalogError) -> Self {
        // A missing handle for one file is retryable for that file; the next
        // attempt requests a fresh one.
        TransferError::transient(err.to_string())
    }
}

/// Top-level failures that abort a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("source inventory fetch failed: {0}")]
    SourceCatalog(#[source] CatalogError),

    #[error("destination inventory fetch failed: {0}")]
    DestinationCatalog(#[source] CatalogError),

    /// Only raised when `abort_on_destination_error` is set; the default
    /// policy logs the rejection and moves on to the next file.
    #[error("destination rejected file {file_id} ({file_name}): {message}")]
    DestinationRejected {
        file_id: String,
        file_name: String,
        message: String,
    },
}
