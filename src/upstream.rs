//! HTTP client for the upstream Salesforce REST API.
//!
//! One `reqwest::Client` is built at startup and reused for every request
//! (connection pooling is an internal optimization, invisible at the
//! contract level). The bearer token, by contrast, is read from disk fresh
//! on every request so operators can rotate it without a restart.
//!
//! No retries happen here: serve-from-cache is the only resilience strategy,
//! and it lives in the request pipeline, not in this client.

use std::path::PathBuf;

use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Where one request is headed: a freshly rendered SOQL query, or a
/// continuation cursor handed out by a previous upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    /// Rendered SOQL text, sent as `?q=<urlencoded>` to the query endpoint
    Soql(String),
    /// Validated cursor: an absolute URL under the instance base, or a
    /// `/services/data/...` path joined onto it
    Cursor(String),
}

/// What came back from upstream: transport succeeded, HTTP status may or may
/// not be 2xx. Transport failures surface as [`AppError::Network`] instead.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Client for the Salesforce query API.
#[derive(Clone)]
pub struct SalesforceClient {
    http: reqwest::Client,
    query_url: String,
    base_url: String,
    token_file: PathBuf,
}

impl SalesforceClient {
    /// Build the client from configuration. The request timeout (default 30s)
    /// is enforced by reqwest; exceeding it is a transport failure, not a
    /// distinct error class.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            query_url: config.query_url(),
            base_url: config
                .sf_base_url
                .as_str()
                .trim_end_matches('/')
                .to_string(),
            token_file: config.sf_token_file.clone(),
        })
    }

    /// Read the upstream bearer token from its protected file.
    ///
    /// Called once per request, before any cache lookup or network call.
    /// An unreadable or empty file is a deployment error, reported to the
    /// caller as 400 `missing_token`.
    pub async fn read_token(&self) -> AppResult<String> {
        let raw = tokio::fs::read_to_string(&self.token_file)
            .await
            .map_err(|_| AppError::MissingToken)?;

        let token = raw.trim().to_string();
        if token.is_empty() {
            return Err(AppError::MissingToken);
        }
        Ok(token)
    }

    /// Resolve a query target to the full request URL.
    pub fn resolve_url(&self, target: &QueryTarget) -> String {
        match target {
            QueryTarget::Soql(soql) => {
                let encoded: String = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("q", soql)
                    .finish();
                format!("{}?{}", self.query_url, encoded)
            }
            QueryTarget::Cursor(cursor) => {
                if cursor.starts_with('/') {
                    format!("{}{}", self.base_url, cursor)
                } else {
                    cursor.clone()
                }
            }
        }
    }

    /// Perform a single GET against the resolved target.
    ///
    /// Returns the body and status for any HTTP-level response (2xx or not);
    /// only transport-level failures (DNS, connect, timeout) become errors.
    pub async fn fetch(&self, target: &QueryTarget, token: &str) -> AppResult<UpstreamResponse> {
        let url = self.resolve_url(target);
        debug!(%url, "Fetching from Salesforce");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        debug!(status, bytes = body.len(), "Salesforce response received");
        Ok(UpstreamResponse { status, body })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn client() -> SalesforceClient {
        SalesforceClient::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_resolve_soql_url_encodes_query() {
        let url = client().resolve_url(&QueryTarget::Soql(
            "SELECT Id FROM Unit__c WHERE Status__c IN ('Deployed') LIMIT 50".to_string(),
        ));

        assert!(url.starts_with(
            "https://example.my.salesforce.com/services/data/v58.0/query?q=SELECT+Id"
        ));
        // Quotes must be percent-encoded
        assert!(url.contains("%27Deployed%27"));
        assert!(!url.contains('\''));
    }

    #[test]
    fn test_resolve_cursor_path_joined_to_base() {
        let url = client().resolve_url(&QueryTarget::Cursor(
            "/services/data/v58.0/query/01g-next".to_string(),
        ));
        assert_eq!(
            url,
            "https://example.my.salesforce.com/services/data/v58.0/query/01g-next"
        );
    }

    #[test]
    fn test_resolve_cursor_absolute_url_passthrough() {
        let absolute = "https://example.my.salesforce.com/services/data/v58.0/query/01g-next";
        let url = client().resolve_url(&QueryTarget::Cursor(absolute.to_string()));
        assert_eq!(url, absolute);
    }

    #[tokio::test]
    async fn test_read_token_trims_whitespace() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  secret-upstream-token  ").unwrap();

        let config = Config {
            sf_token_file: file.path().to_path_buf(),
            ..Config::default()
        };
        let client = SalesforceClient::new(&config).unwrap();

        assert_eq!(client.read_token().await.unwrap(), "secret-upstream-token");
    }

    #[tokio::test]
    async fn test_read_token_missing_file() {
        let config = Config {
            sf_token_file: PathBuf::from("/nonexistent/token"),
            ..Config::default()
        };
        let client = SalesforceClient::new(&config).unwrap();

        assert!(matches!(
            client.read_token().await.unwrap_err(),
            AppError::MissingToken
        ));
    }

    #[tokio::test]
    async fn test_read_token_empty_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();

        let config = Config {
            sf_token_file: file.path().to_path_buf(),
            ..Config::default()
        };
        let client = SalesforceClient::new(&config).unwrap();

        assert!(matches!(
            client.read_token().await.unwrap_err(),
            AppError::MissingToken
        ));
    }

    #[test]
    fn test_is_success_bounds() {
        let ok = UpstreamResponse {
            status: 200,
            body: String::new(),
        };
        let not_modified = UpstreamResponse {
            status: 299,
            body: String::new(),
        };
        let redirect = UpstreamResponse {
            status: 300,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(not_modified.is_success());
        assert!(!redirect.is_success());
    }
}
