use thiserror::Error;
use tracing::info;

use crate::client::PropertySource;
use crate::report::{Report, ReportConfig};
use crate::resolver::{normalize_address, AddressResolver};

/// Terminal outcomes of a lookup that produced no report.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Unable to find APN for this address: {0}")]
    Unresolved(String),

    #[error("No property data found in database for APN {0}.")]
    NoData(String),

    #[error("Failed to connect to API: {0}")]
    Transport(String),

    #[error("API Error {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug)]
pub struct Lookup {
    pub normalized: String,
    pub report: Report,
}

/// raw address → normalized → APN → rows → report.
pub async fn run_lookup(
    config: &ReportConfig,
    resolver: &dyn AddressResolver,
    source: &dyn PropertySource,
    raw_address: &str,
) -> Result<Lookup, LookupError> {
    let normalized = normalize_address(raw_address);
    if normalized.is_empty() {
        return Err(LookupError::Unresolved(raw_address.to_string()));
    }
    info!("Normalized property address: {}", normalized);

    let acct = resolver
        .resolve(&normalized)
        .await
        .ok_or_else(|| LookupError::Unresolved(normalized.clone()))?;

    let rows = source.fetch_property(&acct).await?;
    let mut report = Report::build(config, &acct, &rows);
    if report.record.is_empty() {
        return Err(LookupError::NoData(acct));
    }
    report.summary = report.summary.with_address(normalized.clone());

    info!("{}: {} fields for APN {}", normalized, report.record.len(), acct);
    Ok(Lookup { normalized, report })
}

// ── Tests ──
