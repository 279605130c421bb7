use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::db::TableRows;
use crate::lookup::LookupError;

/// Where the lookup pipeline gets per-table rows from.
#[async_trait]
pub trait PropertySource: Send + Sync {
    async fn fetch_property(&self, acct: &str) -> Result<TableRows, LookupError>;
}

/// Client for the read-only property API.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid API base URL {}", base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API base URL {} cannot carry a path", base_url));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build API client")?;
        Ok(Self { client, base_url })
    }

    /// `<base>/property/<acct>`, with the identifier percent-encoded as one segment.
    pub fn property_url(&self, acct: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("property").push(acct);
        }
        url
    }
}

#[async_trait]
impl PropertySource for ApiClient {
    async fn fetch_property(&self, acct: &str) -> Result<TableRows, LookupError> {
        let url = self.property_url(acct);
        debug!("GET {}", url);

        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            return Err(LookupError::Api {
                status: status.as_u16(),
                body,
            });
        }

        res.json::<TableRows>()
            .await
            .map_err(|e| LookupError::Transport(format!("invalid response body: {}", e)))
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PropertyStore;
    use crate::report::ReportConfig;
    use crate::server::{build_router, AppState};

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn property_url_encodes_identifier() {
        assert_eq!(
            client("http://localhost:8000").property_url("123456").as_str(),
            "http://localhost:8000/property/123456"
        );
        assert_eq!(
            client("http://localhost:8000/api/").property_url("04-10/23 A").as_str(),
            "http://localhost:8000/api/property/04-10%2F23%20A"
        );
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(ApiClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(ApiClient::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
    }

    async fn spawn_api(dir: &std::path::Path) -> String {
        let config = ReportConfig::builtin();
        let tables = config.table_names()[..3].to_vec();
        let store = PropertyStore::new(
            crate::db::tests::fixture_store(dir),
            tables,
            Duration::from_secs(5),
        );
        let app = build_router(AppState::new(store));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn fetches_rows_over_http_in_table_order() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_api(dir.path()).await;

        let rows = client(&base).fetch_property("123456").await.unwrap();
        let tables: Vec<&str> = rows.keys().map(String::as_str).collect();
        assert_eq!(
            tables,
            ["Real_acct_owner_real_acct", "Real_acct_owner_Owners", "Real_acct_owner_Deeds"]
        );
        let cols: Vec<&str> = rows["Real_acct_owner_real_acct"][0]
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(cols, ["acct", "yr", "tot_mkt_val", "lgl_1", "lgl_2"]);
        assert_eq!(rows["Real_acct_owner_Owners"].len(), 2);
    }

    #[tokio::test]
    async fn server_failure_surfaces_status_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = PropertyStore::new(
            dir.path().join("absent.sqlite"),
            vec!["Real_acct_owner_real_acct".to_string()],
            Duration::from_secs(5),
        );
        let app = build_router(AppState::new(store));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let err = client(&format!("http://{}", addr))
            .fetch_property("123456")
            .await
            .unwrap_err();
        match err {
            LookupError::Api { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("detail"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn truncated_error_body_is_reported() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\nshort")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let err = client(&format!("http://{}", addr))
            .fetch_property("123456")
            .await
            .unwrap_err();
        match err {
            LookupError::Api { status, body } => {
                assert_eq!(status, 500);
                assert!(body.starts_with("<unreadable body:"), "{}", body);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_api_is_transport_failure() {
        let err = client("http://127.0.0.1:9").fetch_property("1").await.unwrap_err();
        assert!(matches!(err, LookupError::Transport(_)));
    }
}
