use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Uppercase, drop `,` and `.`, collapse whitespace runs, trim.
///
/// Punctuation goes first so that "HWY , PASADENA" cannot leave a double
/// space behind; the result is stable under a second pass.
pub fn normalize_address(raw: &str) -> String {
    let stripped = raw.replace([',', '.'], "");
    let upper = stripped.to_uppercase();
    WHITESPACE_RE.replace_all(upper.trim(), " ").into_owned()
}

/// Turns a normalized address into a parcel identifier.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// `None` when the address does not resolve.
    async fn resolve(&self, address: &str) -> Option<String>;
}

/// ATTOM property API client. Defaults to the public address endpoint.
pub struct AttomResolver {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl AttomResolver {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build ATTOM client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: "https://api.gateway.attomdata.com/propertyapi/v1.0.0/property/address"
                .to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn lookup(&self, address: &str) -> Result<Option<String>> {
        let res = self
            .client
            .get(&self.endpoint)
            .header("apikey", &self.api_key)
            .header("accept", "application/json")
            .query(&[("address", address)])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            warn!("ATTOM returned {} for {}", status, address);
            return Ok(None);
        }

        let body: serde_json::Value = res.json().await.context("ATTOM response is not JSON")?;
        Ok(apn_from_response(&body))
    }
}

#[async_trait]
impl AddressResolver for AttomResolver {
    async fn resolve(&self, address: &str) -> Option<String> {
        match self.lookup(address).await {
            Ok(Some(apn)) => {
                info!("Resolved {} to APN {}", address, apn);
                Some(apn)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("ATTOM API error for {}: {:#}", address, e);
                None
            }
        }
    }
}

/// `property[0].identifier.apn`, accepting string or numeric APNs.
pub fn apn_from_response(body: &serde_json::Value) -> Option<String> {
    let apn = body
        .get("property")?
        .as_array()?
        .first()?
        .get("identifier")?
        .get("apn")?;
    let apn = match apn {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if apn.is_empty() {
        None
    } else {
        Some(apn)
    }
}

// ── Tests ──
