// piiscrub/src/ui/output_format.rs
//! Themed status messages written to stderr.

use owo_colors::OwoColorize;
use std::io::{self, Write};

use piiscrub_core::OperatorResult;

use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Applies the theme colour for `entry` when `enable_colors` is set.
pub fn paint(text: &str, entry: ThemeEntry, theme: &ThemeMap, enable_colors: bool) -> String {
    if !enable_colors {
        return text.to_string();
    }
    match theme.get(&entry).and_then(|s| s.fg.as_ref()) {
        Some(color) => text.color(color.to_ansi_color()).to_string(),
        None => text.to_string(),
    }
}

/// Paints each substituted span of sanitized output as an entity tag.
///
/// `items` carry output offsets in ascending order.
pub fn highlight_entities(text: &str, items: &[OperatorResult], theme: &ThemeMap, enable_colors: bool) -> String {
    if !enable_colors || items.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + items.len() * 10);
    let mut last = 0;
    for item in items {
        let Some(span) = text.get(item.start..item.end) else { continue };
        if item.start < last || span.is_empty() {
            continue;
        }
        out.push_str(&text[last..item.start]);
        out.push_str(&paint(span, ThemeEntry::EntityTag, theme, true));
        last = item.end;
    }
    out.push_str(&text[last..]);
    out
}

fn print_message<W: Write>(
    writer: &mut W,
    prefix: &str,
    msg: &str,
    entry: ThemeEntry,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    writeln!(writer, "{}", paint(&format!("{}{}", prefix, msg), entry, theme, enable_colors))
}

pub fn print_info_message<W: Write>(writer: &mut W, msg: &str, theme: &ThemeMap, enable_colors: bool) -> io::Result<()> {
    print_message(writer, "", msg, ThemeEntry::Info, theme, enable_colors)
}

pub fn print_success_message<W: Write>(writer: &mut W, msg: &str, theme: &ThemeMap, enable_colors: bool) -> io::Result<()> {
    print_message(writer, "", msg, ThemeEntry::Success, theme, enable_colors)
}

pub fn print_warn_message<W: Write>(writer: &mut W, msg: &str, theme: &ThemeMap, enable_colors: bool) -> io::Result<()> {
    print_message(writer, "Warning: ", msg, ThemeEntry::Warn, theme, enable_colors)
}

pub fn print_error_message<W: Write>(writer: &mut W, msg: &str, theme: &ThemeMap, enable_colors: bool) -> io::Result<()> {
    print_message(writer, "Error: ", msg, ThemeEntry::Error, theme, enable_colors)
}
