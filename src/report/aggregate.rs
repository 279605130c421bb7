use tracing::debug;

use super::config::ReportConfig;
use super::mapping::FieldEntry;
use crate::db::{RawValue, TableRows};

/// Mapped entries of every table for one parcel, in table-processing order.
///
/// A label may appear more than once when two tables map to it; nothing is
/// merged across tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedRecord {
    entries: Vec<FieldEntry>,
}

impl AggregatedRecord {
    pub fn new(entries: Vec<FieldEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FieldEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Value of the first entry carrying `field`.
    pub fn first_value(&self, field: &str) -> Option<&RawValue> {
        self.entries
            .iter()
            .find(|e| e.field == field)
            .map(|e| &e.value)
    }
}

/// Map each configured table's rows and concatenate the results.
///
/// Tables are visited in configuration order regardless of the key order of
/// `rows`; tables with no rows, or absent from `rows`, add nothing.
pub fn aggregate(config: &ReportConfig, rows: &TableRows) -> AggregatedRecord {
    let mut entries = Vec::new();
    for table in config.tables.iter().map(|t| t.table.as_str()) {
        let table_rows = match rows.get(table) {
            Some(r) if !r.is_empty() => r,
            _ => continue,
        };
        let mapped = config.map_table(table, table_rows);
        debug!(
            "{}: {} rows -> {} fields",
            table,
            table_rows.len(),
            mapped.len()
        );
        entries.extend(mapped);
    }
    AggregatedRecord::new(entries)
}

// ── Tests ──
