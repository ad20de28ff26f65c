use crate::entities::FileRecord;
use crate::services::catalog::CatalogService;
use crate::services::ingest::IngestService;
use std::sync::Arc;
use tracing::debug;

pub mod pacer;
pub mod retry;

pub use pacer::Pacer;
pub use retry::{RetryPolicy, TransferOutcome, run_with_retry};

/// Drives one file at a time from source to destination through the retry
/// state machine. The presigned handle is requested inside the retried
/// block, so a handle that expired mid-transfer is simply replaced on the
/// next attempt.
pub struct TransferService {
    catalog: Arc<dyn CatalogService>,
    ingest: Arc<dyn IngestService>,
    policy: RetryPolicy,
}

impl TransferService {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        ingest: Arc<dyn IngestService>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            catalog,
            ingest,
            policy,
        }
    }

    pub async fn transfer_file(&self, record: &FileRecord) -> TransferOutcome {
        run_with_retry(&self.policy, |attempt| async move {
            debug!(
                "Transferring {} ({}), attempt {}",
                record.name, record.id, attempt
            );
            let url = self.catalog.presigned_url(&record.id).await?;
            self.ingest.transfer(&url, record).await
        })
        .await
    }
}
