use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::RawRow;

use super::mapping::{FieldEntry, TableMapping};
use super::sections::SectionDefinition;

/// Field mappings and display sections, loaded once at start-up.
///
/// The order of `tables` is both the fetch order and the aggregation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub tables: Vec<TableMapping>,
    pub sections: Vec<SectionDefinition>,
}

impl ReportConfig {
    /// Use the mapping file when one is configured, the built-in tables otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::builtin()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mapping file {}", path.display()))?;
        let config: ReportConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse mapping file {}", path.display()))?;
        config.validate()?;
        info!(
            "Loaded {} table mappings and {} sections from {}",
            config.tables.len(),
            config.sections.len(),
            path.display()
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            bail!("mapping file defines no tables");
        }
        let mut seen = HashSet::new();
        for t in &self.tables {
            if !seen.insert(t.table.as_str()) {
                bail!("table {} is mapped twice", t.table);
            }
        }
        Ok(())
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.table.clone()).collect()
    }

    pub fn mapping_for(&self, table: &str) -> Option<&TableMapping> {
        self.tables.iter().find(|t| t.table == table)
    }

    /// Map one table's rows; a table without a mapping yields nothing.
    pub fn map_table(&self, table: &str, rows: &[RawRow]) -> Vec<FieldEntry> {
        self.mapping_for(table)
            .map(|m| m.map_rows(rows))
            .unwrap_or_default()
    }

    /// Harris County appraisal-district account tables.
    pub fn builtin() -> Self {
        let tables = vec![
            table(
                "Real_acct_owner_real_acct",
                &[
                    ("acct", "Property ID"),
                    ("yr", "Current Tax Year"),
                    ("mailto", "Owner Name(s)"),
                    ("mail_addr_1", "Mailing Address Line 1"),
                    ("mail_city", "Mailing City"),
                    ("mail_state", "Mailing State"),
                    ("mail_zip", "Mailing ZIP Code"),
                    ("site_addr_1", "Address Line 1"),
                    ("site_addr_2", "City"),
                    ("site_addr_3", "Postal Code"),
                    ("Neighborhood_Grp", "Neighborhood Name"),
                    ("Market_Area_1_Dscr", "Market"),
                    ("Market_Area_2_Dscr", "Tax District"),
                    ("yr_impr", "Year of Construction"),
                    ("acreage", "Land Area(Acre)"),
                    ("land_val", "Land Assessed Value"),
                    ("bld_val", "Improvements Assessed Value"),
                    ("assessed_val", "Assessed Value"),
                    ("tot_appr_val", "Current Appraised Value"),
                    ("tot_mkt_val", "Current Market Value"),
                    ("lgl_1", "Legal Description"),
                    ("lgl_2", "Legal Description"),
                    ("jurs", "Legal Jurisdictions"),
                ],
            ),
            table(
                "Real_acct_owner_Owners",
                &[
                    ("name", "Owner Name(s)"),
                    ("aka", "Grantor (Seller)"),
                    ("pct_own", "Ownership Percentage"),
                ],
            ),
            table(
                "Real_acct_owner_Deeds",
                &[
                    ("dos", "Registration Date"),
                    ("clerk_id", "Registration No."),
                    ("deed_id", "Type of Deed / Instrument"),
                ],
            ),
            table(
                "Real_acct_owner_permits",
                &[
                    ("id", "Building Permit ID"),
                    ("status", "Permit Status"),
                    ("dscr", "Permit Description"),
                    ("permit_tp_descr", "Permit Type Description"),
                    ("property_tp", "Property Type"),
                    ("issue_date", "Permit Issue Date"),
                    ("yr", "Permit Year"),
                ],
            ),
            table(
                "Real_acct_ownership_historyownership_history",
                &[
                    ("purchase_date", "Purchase Date / Sale Date"),
                    ("site_address", "Property Address"),
                ],
            ),
        ];

        let sections = vec![
            section(
                "Property Overview",
                &[
                    "Property ID",
                    "Address Line 1",
                    "City",
                    "Postal Code",
                    "Market",
                    "Neighborhood Name",
                    "Year of Construction",
                    "Land Area(Acre)",
                ],
            ),
            section(
                "Owner Information",
                &[
                    "Owner Name(s)",
                    "Grantor (Seller)",
                    "Ownership Percentage",
                    "Mailing Address Line 1",
                    "Mailing City",
                    "Mailing State",
                    "Mailing ZIP Code",
                ],
            ),
            section(
                "Valuation & Tax",
                &[
                    "Current Market Value",
                    "Current Appraised Value",
                    "Assessed Value",
                    "Land Assessed Value",
                    "Improvements Assessed Value",
                    "Current Tax Year",
                    "Tax District",
                ],
            ),
            section(
                "Permit Details",
                &[
                    "Building Permit ID",
                    "Permit Description",
                    "Permit Year",
                    "Permit Issue Date",
                    "Permit Type Description",
                    "Permit Status",
                ],
            ),
            section(
                "Deed & Legal",
                &[
                    "Type of Deed / Instrument",
                    "Registration No.",
                    "Registration Date",
                    "Legal Description",
                    "Legal Jurisdictions",
                ],
            ),
            section("History", &["Purchase Date / Sale Date"]),
        ];

        ReportConfig { tables, sections }
    }
}

fn table(name: &str, columns: &[(&str, &str)]) -> TableMapping {
    TableMapping {
        table: name.to_string(),
        columns: columns
            .iter()
            .map(|(col, label)| (col.to_string(), label.to_string()))
            .collect::<IndexMap<_, _>>(),
    }
}

fn section(name: &str, fields: &[&str]) -> SectionDefinition {
    SectionDefinition {
        name: name.to_string(),
        fields: fields.iter().map(|f| f.to_string()).collect(),
    }
}

// ── Tests ──
