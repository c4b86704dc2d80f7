// piiscrub/src/ui/summary.rs
//! Tables for the entity summary and the `analyze` command.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use std::io::{self, Write};

use piiscrub_core::{EntitySummaryItem, RecognizerResult};

use crate::ui::output_format::paint;
use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Prints how many spans of each entity type were transformed.
pub fn print_summary<W: Write>(
    items: &[EntitySummaryItem],
    writer: &mut W,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    if items.is_empty() {
        return writeln!(writer, "{}", paint("No PII detected.", ThemeEntry::Success, theme, enable_colors));
    }

    writeln!(writer, "{}", paint("PII Summary:", ThemeEntry::Header, theme, enable_colors))?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Entity", "Occurrences"]);

    for item in items {
        table.add_row(vec![
            Cell::new(paint(&item.entity_type, ThemeEntry::SummaryEntityName, theme, enable_colors)),
            Cell::new(paint(&item.occurrences.to_string(), ThemeEntry::SummaryOccurrences, theme, enable_colors))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    writeln!(writer, "{}", table)
}

/// One row per detection, in text order.
pub fn analysis_table(text: &str, results: &[RecognizerResult]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Entity", "Start", "End", "Score", "Recognizer", "Text"]);

    for r in results {
        table.add_row(vec![
            Cell::new(&r.entity_type),
            Cell::new(r.start).set_alignment(CellAlignment::Right),
            Cell::new(r.end).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}", r.score)).set_alignment(CellAlignment::Right),
            Cell::new(&r.recognizer_name),
            Cell::new(r.matched_text(text).unwrap_or("")),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;

    #[test]
    fn summary_lists_each_entity() {
        let items = vec![
            EntitySummaryItem { entity_type: "EMAIL_ADDRESS".into(), occurrences: 2 },
            EntitySummaryItem { entity_type: "PERSON".into(), occurrences: 1 },
        ];
        let mut buf = Vec::new();
        print_summary(&items, &mut buf, &ThemeStyle::default_theme_map(), false).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("PII Summary:"));
        assert!(out.contains("EMAIL_ADDRESS"));
        assert!(out.contains("PERSON"));
    }

    #[test]
    fn empty_summary() {
        let mut buf = Vec::new();
        print_summary(&[], &mut buf, &ThemeStyle::default_theme_map(), false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "No PII detected.\n");
    }

    #[test]
    fn analysis_table_shows_matched_text() {
        let text = "mail bob@example.com";
        let results = vec![RecognizerResult::new("EMAIL_ADDRESS", 5, 20, 1.0).with_recognizer("email_address")];
        let rendered = analysis_table(text, &results).to_string();
        assert!(rendered.contains("bob@example.com"));
        assert!(rendered.contains("1.00"));
    }
}
