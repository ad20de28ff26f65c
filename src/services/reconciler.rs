use crate::entities::FileRecord;
use std::collections::HashSet;

/// Work lists derived from one reconciliation pass. Computed once per run
/// and immutable afterwards.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    /// Files present in the source but absent at the destination,
    /// in source inventory order.
    pub to_upload: Vec<FileRecord>,
    /// Ids present at the destination but absent in the source,
    /// in destination inventory order.
    pub to_delete: Vec<String>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_upload.is_empty() && self.to_delete.is_empty()
    }
}

/// Diff two inventories by file id.
///
/// Identity is the id alone; content, timestamps and metadata never enter
/// the comparison. Membership checks go through hash sets so large
/// inventories stay O(n + m).
pub fn reconcile(source: Vec<FileRecord>, destination: &[FileRecord]) -> ReconcilePlan {
    let source_ids: HashSet<&str> = source.iter().map(|f| f.id.as_str()).collect();
    let destination_ids: HashSet<&str> = destination.iter().map(|f| f.id.as_str()).collect();

    let to_delete = destination
        .iter()
        .filter(|d| !source_ids.contains(d.id.as_str()))
        .map(|d| d.id.clone())
        .collect();

    let to_upload = source
        .into_iter()
        .filter(|f| !destination_ids.contains(f.id.as_str()))
        .collect();

    ReconcilePlan {
        to_upload,
        to_delete,
    }
}
