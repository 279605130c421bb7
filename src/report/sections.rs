use serde::{Deserialize, Serialize};

use super::aggregate::AggregatedRecord;
use super::mapping::FieldEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub name: String,
    pub fields: Vec<String>,
}

/// A display section with the record entries that belong to it.
#[derive(Debug)]
pub struct Section<'a> {
    pub name: &'a str,
    pub entries: Vec<&'a FieldEntry>,
}

/// Partition the record into sections, in definition order.
///
/// Entries keep record order inside a section. Sections with no entries are
/// left out. A label listed under two sections shows up in both.
pub fn group_sections<'a>(
    definitions: &'a [SectionDefinition],
    record: &'a AggregatedRecord,
) -> Vec<Section<'a>> {
    definitions
        .iter()
        .filter_map(|def| {
            let entries: Vec<&FieldEntry> = record
                .entries()
                .iter()
                .filter(|e| def.fields.iter().any(|f| *f == e.field))
                .collect();
            if entries.is_empty() {
                None
            } else {
                Some(Section {
                    name: &def.name,
                    entries,
                })
            }
        })
        .collect()
}

// ── Tests ──
