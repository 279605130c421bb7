pub mod aggregate;
pub mod config;
pub mod export;
pub mod mapping;
pub mod render;
pub mod sections;
pub mod summary;

use crate::db::TableRows;
use aggregate::AggregatedRecord;
pub use config::ReportConfig;
use summary::Summary;

/// Everything derived from one parcel's rows.
#[derive(Debug, Clone)]
pub struct Report {
    pub acct: String,
    pub record: AggregatedRecord,
    pub summary: Summary,
}

impl Report {
    /// rows → aggregated record → summary.
    pub fn build(config: &ReportConfig, acct: &str, rows: &TableRows) -> Self {
        let record = aggregate::aggregate(config, rows);
        let summary = Summary::extract(&record);
        Report {
            acct: acct.to_string(),
            record,
            summary,
        }
    }

    pub fn sections<'a>(&'a self, config: &'a ReportConfig) -> Vec<sections::Section<'a>> {
        sections::group_sections(&config.sections, &self.record)
    }

    pub fn render_text(&self, config: &ReportConfig) -> String {
        render::render_text(&self.summary, &self.sections(config))
    }
}

// ── Tests ──
