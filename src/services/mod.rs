pub mod catalog;
pub mod ingest;
pub mod migration;
pub mod reconciler;
pub mod table_copy;
pub mod transfer;
