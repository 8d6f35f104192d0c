// Microsoft Graph client - app-only token and paginated reads

use crate::Result;
use crate::error::CredwatchError;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const AUTHORITY_BASE_URL: &str = "https://login.microsoftonline.com";
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Tokens are refreshed this long before they actually expire
const TOKEN_REFRESH_MARGIN_SECONDS: i64 = 300;

/// Client-credentials identity of the application
#[derive(Debug, Clone)]
pub struct GraphCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    value: Vec<Value>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

struct CachedToken {
    value: String,
    refresh_at: DateTime<Utc>,
}

/// Async Microsoft Graph client.
///
/// Holds one cached bearer token; concurrent callers share it.
pub struct GraphClient {
    credentials: GraphCredentials,
    client: reqwest::Client,
    authority_base: String,
    graph_base: String,
    token: Mutex<Option<CachedToken>>,
}

impl GraphClient {
    /// Create a client against the public Graph endpoints
    pub fn new(credentials: GraphCredentials, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            credentials,
            client,
            authority_base: AUTHORITY_BASE_URL.to_string(),
            graph_base: GRAPH_BASE_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Point the client at other token and Graph endpoints
    pub fn with_endpoints(
        mut self,
        authority_base: impl Into<String>,
        graph_base: impl Into<String>,
    ) -> Self {
        self.authority_base = authority_base.into();
        self.graph_base = graph_base.into();
        self
    }

    /// Bearer token, reusing the cached one until its refresh point
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref()
            && Utc::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_base.trim_end_matches('/'),
            self.credentials.tenant_id
        );
        let form = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", GRAPH_SCOPE),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| CredwatchError::directory(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<TokenErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(CredwatchError::directory(format!(
                "failed to acquire access token ({}): {}",
                status, detail
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredwatchError::directory(format!("malformed token response: {}", e)))?;

        let lifetime = (token.expires_in - TOKEN_REFRESH_MARGIN_SECONDS).max(0);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Utc::now() + Duration::seconds(lifetime),
        });

        tracing::debug!("Acquired Graph token valid for {}s", token.expires_in);
        Ok(token.access_token)
    }

    /// Resolve a relative endpoint against the Graph base URL
    fn resolve(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.graph_base.trim_end_matches('/'), endpoint)
        }
    }

    /// Every item of a collection, following `@odata.nextLink` until exhausted
    pub async fn get_all_pages(&self, endpoint: &str) -> Result<Vec<Value>> {
        let mut results = Vec::new();
        let mut next = Some(self.resolve(endpoint));
        let mut pages = 0usize;

        while let Some(url) = next {
            let token = self.access_token().await?;
            let response = self
                .client
                .get(&url)
                .bearer_auth(token)
                .send()
                .await
                .map_err(|e| CredwatchError::directory(format!("GET {} failed: {}", endpoint, e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(CredwatchError::directory(format!(
                    "GET {} returned {}: {}",
                    endpoint, status, body
                )));
            }

            let page: Page = response.json().await.map_err(|e| {
                CredwatchError::directory(format!("malformed page from {}: {}", endpoint, e))
            })?;

            pages += 1;
            results.extend(page.value);
            next = page.next_link;
        }

        tracing::debug!("Fetched {} items from {} in {} pages", results.len(), endpoint, pages);
        Ok(results)
    }

    /// POST a JSON body; returns the raw response status on success
    pub async fn post_json(&self, endpoint: &str, body: &Value) -> Result<reqwest::StatusCode> {
        let token = self.access_token().await?;
        let response = self
            .client
            .post(self.resolve(endpoint))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CredwatchError::Other(format!(
                "POST {} returned {}: {}",
                endpoint, status, text
            )));
        }

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GraphClient {
        GraphClient::new(
            GraphCredentials {
                tenant_id: "tenant".to_string(),
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
            },
            5,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let graph = client();
        assert_eq!(
            graph.resolve("/applications"),
            "https://graph.microsoft.com/v1.0/applications"
        );

        let next = "https://graph.microsoft.com/v1.0/applications?$skiptoken=abc";
        assert_eq!(graph.resolve(next), next);
    }

    #[test]
    fn test_page_parsing() {
        let page: Page = serde_json::from_str(
            r#"{"value":[{"id":"1"},{"id":"2"}],"@odata.nextLink":"https://next"}"#,
        )
        .unwrap();
        assert_eq!(page.value.len(), 2);
        assert_eq!(page.next_link.as_deref(), Some("https://next"));

        let last: Page = serde_json::from_str(r#"{"value":[]}"#).unwrap();
        assert!(last.next_link.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_authority_is_directory_error() {
        let graph = client().with_endpoints("http://127.0.0.1:9", "http://127.0.0.1:9/v1.0");
        let err = graph.get_all_pages("/applications").await.unwrap_err();
        assert!(matches!(err, CredwatchError::DirectoryAccess { .. }));
    }
}
