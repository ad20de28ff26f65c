use std::env;
use std::path::PathBuf;

/// Connection settings for one Nhost deployment.
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    /// Hasura GraphQL endpoint, e.g. `https://xyz.graphql.eu-central-1.nhost.run/v1`
    pub graphql_url: String,

    /// hasura-storage endpoint, e.g. `https://xyz.storage.eu-central-1.nhost.run/v1`
    pub storage_url: String,

    /// Admin secret sent as `x-hasura-admin-secret` on every call
    pub admin_secret: String,

    /// Postgres connection string, only needed for the table-copy step
    pub pg_connection: Option<String>,
}

impl DeploymentConfig {
    /// Load one side's settings from `{PREFIX}_GRAPHQL_URL`, `{PREFIX}_STORAGE_URL`,
    /// `{PREFIX}_ADMIN_SECRET` and `{PREFIX}_PG_CONNECTION`.
    pub fn from_env(prefix: &str) -> anyhow::Result<Self> {
        let var = |name: &str| {
            let key = format!("{}_{}", prefix, name);
            env::var(&key).map_err(|_| anyhow::anyhow!("{} must be set", key))
        };

        Ok(Self {
            graphql_url: var("GRAPHQL_URL")?,
            storage_url: var("STORAGE_URL")?,
            admin_secret: var("ADMIN_SECRET")?,
            pg_connection: env::var(format!("{}_PG_CONNECTION", prefix)).ok(),
        })
    }
}

/// Run-level configuration for a migration.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Pause between file transfers in milliseconds (default: 1000)
    pub transfer_pause_ms: u64,

    /// Retries per file after the first attempt (default: 2)
    pub max_retries: u32,

    /// Abort the run when the destination rejects a file with an
    /// application-level error (default: false — log, count, continue)
    pub abort_on_destination_error: bool,

    /// Schemas handled by the table-copy step (default: storage, public, auth)
    pub schemas: Vec<String>,

    /// Directory for the table-copy CSV exports (default: ./exports)
    pub export_dir: PathBuf,

    /// Reconcile and log the plan without uploading or deleting anything
    pub dry_run: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            transfer_pause_ms: 1000,
            max_retries: 2,
            abort_on_destination_error: false,
            schemas: vec![
                "storage".to_string(),
                "public".to_string(),
                "auth".to_string(),
            ],
            export_dir: PathBuf::from("exports"),
            dry_run: false,
        }
    }
}

impl MigrationConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            transfer_pause_ms: env::var("SLEEP_BETWEEN_TRANSFERS_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.transfer_pause_ms),

            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_retries),

            abort_on_destination_error: env::var("ABORT_ON_DESTINATION_ERROR")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.abort_on_destination_error),

            schemas: env::var("MIGRATE_SCHEMAS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.schemas),

            export_dir: env::var("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.export_dir),

            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MigrationConfig::default();
        assert_eq!(config.transfer_pause_ms, 1000);
        assert_eq!(config.max_retries, 2);
        assert!(!config.abort_on_destination_error);
        assert_eq!(config.schemas, vec!["storage", "public", "auth"]);
        assert_eq!(config.export_dir, PathBuf::from("exports"));
    }

    #[test]
    fn test_deployment_config_requires_core_vars() {
        let result = DeploymentConfig::from_env("DOES_NOT_EXIST");
        assert!(result.is_err());
    }
}
