use crate::config::MigrationConfig;
use crate::error::{MigrationError, TransferErrorKind};
use crate::services::catalog::CatalogService;
use crate::services::ingest::IngestService;
use crate::services::reconciler::reconcile;
use crate::services::transfer::{Pacer, RetryPolicy, TransferOutcome, TransferService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Counters for one run. Returned to the caller and logged as the exit
/// summary; never persisted.
#[derive(Debug, Default, Clone)]
pub struct MigrationStats {
    pub source_files: usize,
    pub destination_files: usize,
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub deleted: u64,
    pub bulk_delete_failed: bool,
}

/// One migration run: configuration, both catalog clients, and the transfer
/// pipeline, carried explicitly instead of living in process-wide state.
pub struct MigrationRun {
    config: MigrationConfig,
    source: Arc<dyn CatalogService>,
    destination: Arc<dyn CatalogService>,
    transfer: TransferService,
    pacer: Pacer,
}

impl MigrationRun {
    pub fn new(
        config: MigrationConfig,
        source: Arc<dyn CatalogService>,
        destination: Arc<dyn CatalogService>,
        ingest: Arc<dyn IngestService>,
    ) -> Self {
        let policy = RetryPolicy::new(
            config.max_retries,
            Duration::from_millis(config.transfer_pause_ms),
        );
        let transfer = TransferService::new(source.clone(), ingest, policy);
        let pacer = Pacer::from_millis(config.transfer_pause_ms);

        Self {
            config,
            source,
            destination,
            transfer,
            pacer,
        }
    }

    /// Fetch both inventories, reconcile, transfer the missing files one at
    /// a time, then delete destination-only files in one batch.
    ///
    /// Only inventory failures abort the run (there is nothing safe to do
    /// without a full inventory). A single file exhausting its retries is
    /// logged and counted; the run moves on. A destination-side rejection
    /// aborts only when `abort_on_destination_error` is set.
    pub async fn execute(&self) -> Result<MigrationStats, MigrationError> {
        let mut stats = MigrationStats::default();

        let source_inventory = self
            .source
            .fetch_inventory()
            .await
            .map_err(MigrationError::SourceCatalog)?;
        let destination_inventory = self
            .destination
            .fetch_inventory()
            .await
            .map_err(MigrationError::DestinationCatalog)?;

        stats.source_files = source_inventory.len();
        stats.destination_files = destination_inventory.len();
        info!(
            "📋 Inventories: {} source files, {} destination files",
            stats.source_files, stats.destination_files
        );

        let plan = reconcile(source_inventory, &destination_inventory);
        info!(
            "🔀 Plan: {} to upload, {} to delete",
            plan.to_upload.len(),
            plan.to_delete.len()
        );

        if self.config.dry_run {
            for file in &plan.to_upload {
                info!("  would upload {} ({})", file.name, file.id);
            }
            for id in &plan.to_delete {
                info!("  would delete {}", id);
            }
            return Ok(stats);
        }

        let total = plan.to_upload.len();
        for (index, record) in plan.to_upload.iter().enumerate() {
            match self.transfer.transfer_file(record).await {
                TransferOutcome::Succeeded { attempts } => {
                    stats.uploaded += 1;
                    info!(
                        "✅ [{}/{}] Transferred {} ({}) in {} attempt(s)",
                        index + 1,
                        total,
                        record.name,
                        record.id,
                        attempts
                    );
                }
                TransferOutcome::Skipped { .. } => {
                    stats.skipped += 1;
                    info!(
                        "⏭️  [{}/{}] Skipped {} ({}): already at destination",
                        index + 1,
                        total,
                        record.name,
                        record.id
                    );
                }
                TransferOutcome::Exhausted { attempts, error } => {
                    stats.failed += 1;
                    if error.kind == TransferErrorKind::Application
                        && self.config.abort_on_destination_error
                    {
                        return Err(MigrationError::DestinationRejected {
                            file_id: record.id.clone(),
                            file_name: record.name.clone(),
                            message: error.message,
                        });
                    }
                    error!(
                        "❌ [{}/{}] Giving up on {} ({}) after {} attempt(s): {}",
                        index + 1,
                        total,
                        record.name,
                        record.id,
                        attempts,
                        error
                    );
                }
            }
            self.pacer.pause().await;
        }

        if !plan.to_delete.is_empty() {
            match self.destination.delete_files(&plan.to_delete).await {
                Ok(affected) => {
                    stats.deleted = affected;
                    info!("🗑️  Deleted {} destination-only files", affected);
                }
                Err(e) => {
                    // The next run's reconciliation picks these ids up again.
                    stats.bulk_delete_failed = true;
                    error!("Bulk delete failed, continuing: {}", e);
                }
            }
        }

        info!(
            "🏁 Run complete: {} uploaded, {} skipped, {} failed, {} deleted",
            stats.uploaded, stats.skipped, stats.failed, stats.deleted
        );
        Ok(stats)
    }
}
