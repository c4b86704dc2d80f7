// piiscrub/src/ui/diff_viewer.rs
//! Line diff between the original and sanitized text.

use diffy::{create_patch, Line as DiffLine};
use std::io::{self, Write};

use crate::ui::output_format::paint;
use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Writes a `-`/`+` line diff of `original` against `sanitized`.
pub fn print_diff<W: Write>(
    original: &str,
    sanitized: &str,
    writer: &mut W,
    theme: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    let patch = create_patch(original, sanitized);

    writeln!(writer, "{}", paint("--- Diff Analysis ---", ThemeEntry::DiffHeader, theme, enable_colors))?;

    let mut changed = false;
    for hunk in patch.hunks() {
        for line in hunk.lines() {
            match line {
                DiffLine::Delete(s) => {
                    changed = true;
                    let text = format!("- {}", s.trim_end_matches('\n'));
                    writeln!(writer, "{}", paint(&text, ThemeEntry::DiffRemoved, theme, enable_colors))?;
                }
                DiffLine::Insert(s) => {
                    changed = true;
                    let text = format!("+ {}", s.trim_end_matches('\n'));
                    writeln!(writer, "{}", paint(&text, ThemeEntry::DiffAdded, theme, enable_colors))?;
                }
                DiffLine::Context(s) => writeln!(writer, "  {}", s.trim_end_matches('\n'))?,
            }
        }
    }

    if !changed {
        writeln!(writer, "No changes detected.")?;
    }
    writeln!(writer, "{}", paint("---------------------", ThemeEntry::DiffHeader, theme, enable_colors))
}
