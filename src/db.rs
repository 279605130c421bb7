use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use indexmap::IndexMap;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One column value as the store hands it back.
///
/// Text becomes `Date` only when it is already in canonical `YYYY-MM-DD`
/// form, so the value prints back exactly as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Integer(i64),
    Real(f64),
    Date(NaiveDate),
    Text(String),
}

impl RawValue {
    pub fn from_text(text: String) -> Self {
        match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            Ok(date) if date.format("%Y-%m-%d").to_string() == text => RawValue::Date(date),
            _ => RawValue::Text(text),
        }
    }

    /// Null and empty text count as "no value".
    pub fn is_absent(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Join two values with a single space; absent operands contribute nothing.
    pub fn joined(&self, other: &RawValue) -> RawValue {
        match (self.is_absent(), other.is_absent()) {
            (_, true) => self.clone(),
            (true, false) => RawValue::Text(other.to_string()),
            (false, false) => RawValue::Text(format!("{} {}", self, other)),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Integer(i) => write!(f, "{}", i),
            RawValue::Real(r) => write!(f, "{}", r),
            RawValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<ValueRef<'_>> for RawValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => RawValue::Null,
            ValueRef::Integer(i) => RawValue::Integer(i),
            ValueRef::Real(r) => RawValue::Real(r),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                RawValue::from_text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawValueVisitor)
    }
}

struct RawValueVisitor;

impl<'de> Visitor<'de> for RawValueVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("null, a number or a string")
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<RawValue, E> {
        Ok(RawValue::Integer(v as i64))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawValue, E> {
        Ok(RawValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawValue, E> {
        Ok(i64::try_from(v)
            .map(RawValue::Integer)
            .unwrap_or(RawValue::Real(v as f64)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawValue, E> {
        Ok(RawValue::Real(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawValue, E> {
        Ok(RawValue::from_text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RawValue, E> {
        Ok(RawValue::from_text(v))
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// Column name → value, in the column order of the source table.
pub type RawRow = IndexMap<String, RawValue>;

/// Table name → every row matching the parcel, in fetch order.
pub type TableRows = IndexMap<String, Vec<RawRow>>;

pub fn connect(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open property store {}", path.display()))?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}

/// Fetch every row for `acct` from each table. One failing table fails the whole fetch.
pub fn fetch_property(conn: &Connection, tables: &[String], acct: &str) -> Result<TableRows> {
    let mut results = TableRows::with_capacity(tables.len());
    for table in tables {
        let rows = fetch_table(conn, table, acct)
            .with_context(|| format!("Failed to query {}", table))?;
        debug!("{}: {} rows for acct {}", table, rows.len(), acct);
        results.insert(table.clone(), rows);
    }
    Ok(results)
}

fn fetch_table(conn: &Connection, table: &str, acct: &str) -> Result<Vec<RawRow>> {
    // Table names come from configuration; the identifier is always bound.
    let sql = format!(
        "SELECT * FROM \"{}\" WHERE acct = ?1",
        table.replace('"', "\"\"")
    );
    let mut stmt = conn.prepare(&sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map([acct], |row| {
            let mut raw = RawRow::with_capacity(columns.len());
            for (i, name) in columns.iter().enumerate() {
                raw.insert(name.clone(), RawValue::from(row.get_ref(i)?));
            }
            Ok(raw)
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Lock waits outlast the fetch deadline so callers always see the deadline.
const BUSY_GRACE: Duration = Duration::from_millis(500);

/// Read-only handle on the property store. Opens one connection per fetch and
/// drops it before returning.
#[derive(Clone)]
pub struct PropertyStore {
    path: PathBuf,
    tables: Arc<[String]>,
    timeout: Duration,
}

impl PropertyStore {
    pub fn new(path: impl Into<PathBuf>, tables: Vec<String>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            tables: tables.into(),
            timeout,
        }
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub async fn fetch(&self, acct: &str) -> Result<TableRows> {
        let path = self.path.clone();
        let tables = Arc::clone(&self.tables);
        let acct_owned = acct.to_string();
        let timeout = self.timeout;

        // A timed-out task is not cancelled: it keeps its connection until the
        // lock wait below gives up, about BUSY_GRACE after the deadline.
        let task = tokio::task::spawn_blocking(move || {
            let conn = connect(&path, timeout + BUSY_GRACE)?;
            fetch_property(&conn, &tables, &acct_owned)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined.context("Property fetch task panicked")?,
            Err(_) => Err(anyhow!(
                "Property fetch for {} timed out after {:.1}s",
                acct,
                timeout.as_secs_f64()
            )),
        }
    }
}

// ── Tests ──
