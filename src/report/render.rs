use std::fmt::Write;

use super::sections::Section;
use super::summary::{Summary, SummaryKey, PLACEHOLDER};

/// Plain-text report: summary card followed by one block per section.
pub fn render_text(summary: &Summary, sections: &[Section<'_>]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "── Property Summary ──");
    for (key, value) in summary.entries() {
        let shown = match key {
            SummaryKey::MarketValue if value != PLACEHOLDER => format!("${}", value),
            SummaryKey::LandArea if value != PLACEHOLDER => format!("{} acres", value),
            _ => value.to_string(),
        };
        let _ = writeln!(out, "  {:<17} {}", format!("{}:", key.title()), shown);
    }

    for section in sections {
        let _ = writeln!(out, "\n── {} ──", section.name);
        for entry in &section.entries {
            let _ = writeln!(out, "  {}: {}", entry.field, entry.value);
        }
    }

    out
}

// ── Tests ──
