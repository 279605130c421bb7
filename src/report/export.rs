use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use super::aggregate::AggregatedRecord;

/// One (Field, Value) pair as both export formats write it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Field")]
    pub field: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Shared projection behind both formats; null values become empty strings.
pub fn export_rows(record: &AggregatedRecord) -> Vec<ExportRow> {
    record
        .entries()
        .iter()
        .map(|e| ExportRow {
            field: e.field.clone(),
            value: e.value.to_string(),
        })
        .collect()
}

pub fn to_csv(record: &AggregatedRecord) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(["Field", "Value"])?;
    for row in export_rows(record) {
        writer.write_record([&row.field, &row.value])?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV export: {}", e.error()))
}

pub fn to_json(record: &AggregatedRecord) -> Result<String> {
    serde_json::to_string_pretty(&export_rows(record)).context("Failed to encode JSON export")
}

/// Normalized address with spaces replaced by underscores.
pub fn safe_filename(normalized: &str) -> String {
    normalized.replace(' ', "_")
}

/// Write `<safe-name>.csv` and `<safe-name>.json` into `dir`.
pub fn write_exports(
    dir: &Path,
    normalized: &str,
    record: &AggregatedRecord,
) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export dir {}", dir.display()))?;
    let stem = safe_filename(normalized);

    let csv_path = dir.join(format!("{}.csv", stem));
    std::fs::write(&csv_path, to_csv(record)?)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;

    let json_path = dir.join(format!("{}.json", stem));
    std::fs::write(&json_path, to_json(record)?)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    Ok((csv_path, json_path))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RawValue;
    use crate::report::mapping::FieldEntry;

    fn sample() -> AggregatedRecord {
        AggregatedRecord::new(vec![
            FieldEntry::new("Property ID", "123456"),
            FieldEntry::new("Owner Name(s)", "DOE, JANE \"JJ\""),
            FieldEntry::new("Ownership Percentage", RawValue::Real(50.5)),
            FieldEntry::new("Grantor (Seller)", RawValue::Null),
            FieldEntry::new("Legal Description", "LOT 4 BLK\n2 SEC 1"),
        ])
    }

    #[test]
    fn csv_and_json_decode_to_the_same_rows() {
        let record = sample();
        let csv_bytes = to_csv(&record).unwrap();
        let json = to_json(&record).unwrap();

        let from_csv: Vec<ExportRow> = csv::Reader::from_reader(csv_bytes.as_slice())
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap();
        let from_json: Vec<ExportRow> = serde_json::from_str(&json).unwrap();

        assert_eq!(from_csv, from_json);
        assert_eq!(from_csv, export_rows(&record));
        assert_eq!(from_json[2].value, "50.5");
        assert_eq!(from_json[3].value, "");
    }

    #[test]
    fn csv_header_and_quoting() {
        let text = String::from_utf8(to_csv(&sample()).unwrap()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Field,Value"));
        assert_eq!(lines.next(), Some("Property ID,123456"));
        assert_eq!(lines.next(), Some(r#"Owner Name(s),"DOE, JANE ""JJ""""#));
    }

    #[test]
    fn empty_record_still_has_header() {
        let record = AggregatedRecord::default();
        assert_eq!(to_csv(&record).unwrap(), b"Field,Value\n");
        assert_eq!(to_json(&record).unwrap(), "[]");
    }

    #[test]
    fn json_uses_field_value_keys() {
        let json = to_json(&AggregatedRecord::new(vec![FieldEntry::new("Property ID", "1")])).unwrap();
        assert_eq!(json, "[\n  {\n    \"Field\": \"Property ID\",\n    \"Value\": \"1\"\n  }\n]");
    }

    #[test]
    fn exports_land_under_safe_name() {
        let dir = tempfile::tempdir().unwrap();
        let (csv_path, json_path) =
            write_exports(dir.path(), "4702 SPENCER HWY PASADENA TX 77505", &sample()).unwrap();
        assert_eq!(
            csv_path.file_name().unwrap(),
            "4702_SPENCER_HWY_PASADENA_TX_77505.csv"
        );
        assert_eq!(
            json_path.file_name().unwrap(),
            "4702_SPENCER_HWY_PASADENA_TX_77505.json"
        );
        assert!(std::fs::read_to_string(csv_path).unwrap().starts_with("Field,Value"));
    }
}
