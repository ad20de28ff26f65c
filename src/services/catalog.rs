use crate::entities::FileRecord;
use crate::error::CatalogError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Full-inventory query. hasura-storage keeps the catalog in the `files`
/// table; a single unpaginated query returns every record.
const ALL_FILES_QUERY: &str = r#"
{
  files {
    id
    bucketId
    createdAt
    updatedAt
    name
    size
    mimeType
    etag
    isUploaded
    uploadedByUserId
    metadata
  }
}
"#;

const DELETE_FILES_MUTATION: &str = r#"
mutation($ids: [uuid!]!) {
  deleteFiles(where: {id: {_in: $ids}}) {
    affected_rows
  }
}
"#;

/// Catalog operations against one deployment.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetch every file record the deployment knows about.
    async fn fetch_inventory(&self) -> Result<Vec<FileRecord>, CatalogError>;

    /// Obtain a short-lived direct-download URL for one file.
    async fn presigned_url(&self, file_id: &str) -> Result<String, CatalogError>;

    /// Delete the given file ids in one batched mutation. Returns the
    /// affected-row count reported by the deployment.
    async fn delete_files(&self, ids: &[String]) -> Result<u64, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PresignedUrlResponse {
    url: String,
}

/// Catalog client backed by a deployment's Hasura GraphQL endpoint and its
/// hasura-storage API.
pub struct GraphqlCatalog {
    http: reqwest::Client,
    graphql_url: String,
    storage_url: String,
    admin_secret: String,
}

impl GraphqlCatalog {
    pub fn new(
        http: reqwest::Client,
        graphql_url: String,
        storage_url: String,
        admin_secret: String,
    ) -> Self {
        Self {
            http,
            graphql_url,
            storage_url,
            admin_secret,
        }
    }

    async fn graphql(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, String> {
        let mut body = json!({ "query": query });
        if let Some(vars) = variables {
            body["variables"] = vars;
        }

        let response = self
            .http
            .post(&self.graphql_url)
            .header("x-hasura-admin-secret", &self.admin_secret)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("graphql endpoint returned {}", status));
        }

        let parsed: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| format!("invalid graphql response: {}", e))?;

        if let Some(errors) = parsed.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(messages.join("; "));
        }

        parsed.data.ok_or_else(|| "empty graphql response".to_string())
    }
}

#[async_trait]
impl CatalogService for GraphqlCatalog {
    async fn fetch_inventory(&self) -> Result<Vec<FileRecord>, CatalogError> {
        let data = self
            .graphql(ALL_FILES_QUERY, None)
            .await
            .map_err(CatalogError::Unavailable)?;

        let files = data
            .get("files")
            .cloned()
            .ok_or_else(|| CatalogError::Unavailable("response missing files field".to_string()))?;

        serde_json::from_value(files)
            .map_err(|e| CatalogError::Unavailable(format!("malformed file record: {}", e)))
    }

    async fn presigned_url(&self, file_id: &str) -> Result<String, CatalogError> {
        let url = format!("{}/files/{}/presignedurl", self.storage_url, file_id);

        let response = self
            .http
            .get(&url)
            .header("x-hasura-admin-secret", &self.admin_secret)
            .send()
            .await
            .map_err(|e| CatalogError::HandleUnavailable {
                file_id: file_id.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::HandleUnavailable {
                file_id: file_id.to_string(),
                reason: format!("storage endpoint returned {}", status),
            });
        }

        let parsed: PresignedUrlResponse =
            response
                .json()
                .await
                .map_err(|e| CatalogError::HandleUnavailable {
                    file_id: file_id.to_string(),
                    reason: format!("invalid presigned url response: {}", e),
                })?;

        Ok(parsed.url)
    }

    async fn delete_files(&self, ids: &[String]) -> Result<u64, CatalogError> {
        let data = self
            .graphql(DELETE_FILES_MUTATION, Some(json!({ "ids": ids })))
            .await
            .map_err(CatalogError::BulkDelete)?;

        data.pointer("/deleteFiles/affected_rows")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| {
                CatalogError::BulkDelete("response missing affected_rows".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_query_requests_every_catalog_field() {
        for field in [
            "id",
            "bucketId",
            "createdAt",
            "updatedAt",
            "name",
            "size",
            "mimeType",
            "etag",
            "isUploaded",
            "uploadedByUserId",
            "metadata",
        ] {
            assert!(
                ALL_FILES_QUERY.contains(field),
                "query is missing {}",
                field
            );
        }
    }

    #[test]
    fn test_graphql_error_payload_parses() {
        let raw = r#"{"errors": [{"message": "field not found"}, {"message": "x"}]}"#;
        let parsed: GraphqlResponse = serde_json::from_str(raw).unwrap();
        let errors = parsed.errors.unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "field not found");
        assert!(parsed.data.is_none());
    }
}
