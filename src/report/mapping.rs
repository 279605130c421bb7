use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::db::{RawRow, RawValue};

/// The one label whose repeated columns are joined instead of overwritten.
pub const LEGAL_DESCRIPTION: &str = "Legal Description";

/// Raw column → canonical label for one source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMapping {
    pub table: String,
    pub columns: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub field: String,
    pub value: RawValue,
}

impl FieldEntry {
    pub fn new(field: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl TableMapping {
    /// Project the first row onto canonical labels.
    ///
    /// Later rows for the same parcel are ignored: each table is treated as
    /// holding one current record per account, so extra owners or permits are
    /// not shown. Unmapped columns are dropped. A label hit twice keeps its
    /// first position and takes the later value, except `Legal Description`,
    /// which is joined with a space.
    pub fn map_rows(&self, rows: &[RawRow]) -> Vec<FieldEntry> {
        let Some(row) = rows.first() else {
            return Vec::new();
        };

        let mut mapped: IndexMap<&str, RawValue> = IndexMap::new();
        for (column, value) in row {
            let Some(label) = self.columns.get(column) else {
                continue;
            };
            if label == LEGAL_DESCRIPTION {
                if let Some(existing) = mapped.get_mut(label.as_str()) {
                    *existing = existing.joined(value);
                    continue;
                }
            }
            mapped.insert(label.as_str(), value.clone());
        }

        mapped
            .into_iter()
            .map(|(field, value)| FieldEntry::new(field, value))
            .collect()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::config::ReportConfig;

    fn row(pairs: &[(&str, RawValue)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn acct_mapping() -> TableMapping {
        ReportConfig::builtin()
            .mapping_for("Real_acct_owner_real_acct")
            .unwrap()
            .clone()
    }

    #[test]
    fn empty_rows_map_to_nothing_for_every_table() {
        for mapping in ReportConfig::builtin().tables {
            assert!(mapping.map_rows(&[]).is_empty(), "{}", mapping.table);
        }
    }

    #[test]
    fn legal_description_columns_are_joined() {
        let rows = vec![row(&[
            ("lgl_1", "LOT 4 BLK".into()),
            ("lgl_2", "2 SEC 1".into()),
        ])];
        assert_eq!(
            acct_mapping().map_rows(&rows),
            vec![FieldEntry::new(LEGAL_DESCRIPTION, "LOT 4 BLK 2 SEC 1")]
        );
    }

    #[test]
    fn absent_legal_part_adds_nothing() {
        let rows = vec![row(&[("lgl_1", "LOT 4 BLK".into()), ("lgl_2", RawValue::Null)])];
        assert_eq!(
            acct_mapping().map_rows(&rows),
            vec![FieldEntry::new(LEGAL_DESCRIPTION, "LOT 4 BLK")]
        );

        let rows = vec![row(&[("lgl_1", RawValue::Null), ("lgl_2", "2 SEC 1".into())])];
        assert_eq!(
            acct_mapping().map_rows(&rows),
            vec![FieldEntry::new(LEGAL_DESCRIPTION, "2 SEC 1")]
        );
    }

    #[test]
    fn only_first_row_counts() {
        let mapping = ReportConfig::builtin()
            .mapping_for("Real_acct_owner_Owners")
            .unwrap()
            .clone();
        let rows = vec![
            row(&[("name", "DOE JANE".into())]),
            row(&[("name", "DOE JOHN".into())]),
        ];
        assert_eq!(
            mapping.map_rows(&rows),
            vec![FieldEntry::new("Owner Name(s)", "DOE JANE")]
        );
    }

    #[test]
    fn unmapped_columns_dropped_and_column_order_kept() {
        let rows = vec![row(&[
            ("tot_mkt_val", "250000".into()),
            ("internal_flag", "Y".into()),
            ("acct", "123456".into()),
            ("yr", RawValue::Integer(2024)),
        ])];
        let entries = acct_mapping().map_rows(&rows);
        let fields: Vec<&str> = entries.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["Current Market Value", "Property ID", "Current Tax Year"]);
    }

    #[test]
    fn repeated_label_overwrites_in_place() {
        let mapping = TableMapping {
            table: "t".to_string(),
            columns: [("a", "Name"), ("b", "Other"), ("c", "Name")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        let rows = vec![row(&[("a", "first".into()), ("b", "x".into()), ("c", "second".into())])];
        assert_eq!(
            mapping.map_rows(&rows),
            vec![FieldEntry::new("Name", "second"), FieldEntry::new("Other", "x")]
        );
    }

    #[test]
    fn mapping_is_deterministic() {
        let rows = vec![row(&[
            ("acct", "1".into()),
            ("mailto", "DOE JANE".into()),
            ("lgl_1", "A".into()),
            ("lgl_2", "B".into()),
        ])];
        let mapping = acct_mapping();
        assert_eq!(mapping.map_rows(&rows), mapping.map_rows(&rows));
    }
}
