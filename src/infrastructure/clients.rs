use crate::config::DeploymentConfig;
use crate::services::catalog::GraphqlCatalog;
use crate::services::ingest::HttpIngest;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// HTTP-backed service handles for one run.
pub struct Clients {
    pub source: Arc<GraphqlCatalog>,
    pub destination: Arc<GraphqlCatalog>,
    pub ingest: Arc<HttpIngest>,
}

/// Build the shared HTTP client and the per-deployment service handles.
///
/// One connection pool is shared across every call of the run; no
/// per-request timeout is set because large file bodies stream for as long
/// as they need, only connect is bounded.
pub fn setup_clients(source: &DeploymentConfig, destination: &DeploymentConfig) -> Result<Clients> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("nhost-migrate/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .context("building HTTP client")?;

    let source_graphql = normalize_url(&source.graphql_url)?;
    let source_storage = normalize_url(&source.storage_url)?;
    let destination_graphql = normalize_url(&destination.graphql_url)?;
    let destination_storage = normalize_url(&destination.storage_url)?;

    info!("🔗 Source: {}", source_graphql);
    info!("🔗 Destination: {}", destination_graphql);

    let source_catalog = Arc::new(GraphqlCatalog::new(
        http.clone(),
        source_graphql,
        source_storage,
        source.admin_secret.clone(),
    ));
    let destination_catalog = Arc::new(GraphqlCatalog::new(
        http.clone(),
        destination_graphql,
        destination_storage.clone(),
        destination.admin_secret.clone(),
    ));
    let ingest = Arc::new(HttpIngest::new(
        http,
        destination_storage,
        destination.admin_secret.clone(),
    ));

    Ok(Clients {
        source: source_catalog,
        destination: destination_catalog,
        ingest,
    })
}

/// Validate an endpoint URL and strip any trailing slash so path joins stay
/// predictable.
fn normalize_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw).with_context(|| format!("invalid endpoint URL {:?}", raw))?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_strips_trailing_slash() {
        let url = normalize_url("https://xyz.storage.eu-central-1.nhost.run/v1/").unwrap();
        assert_eq!(url, "https://xyz.storage.eu-central-1.nhost.run/v1");
    }

    #[test]
    fn test_normalize_url_rejects_garbage() {
        assert!(normalize_url("not a url").is_err());
    }
}
