// piiscrub/src/ui/theme.rs
//! Colour themes for terminal output.
//!
//! A theme maps each kind of output (messages, diff lines, summary columns)
//! to one of the 16 named ANSI colours. Custom themes are YAML files:
//!
//! ```yaml
//! info: { fg: cyan }
//! diff_added: { fg: brightgreen }
//! ```
//!
//! Entries missing from a custom theme fall back to the default theme.

use anyhow::{Context, Result};
use owo_colors::AnsiColors;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub type ThemeMap = HashMap<ThemeEntry, ThemeStyle>;

/// The parts of the output that can be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeEntry {
    Header,
    Success,
    Info,
    Warn,
    Error,
    /// Placeholders and tags in sanitized output.
    EntityTag,
    DiffAdded,
    DiffRemoved,
    DiffHeader,
    SummaryEntityName,
    SummaryOccurrences,
}

impl ThemeEntry {
    pub const ALL: [ThemeEntry; 11] = [
        ThemeEntry::Header,
        ThemeEntry::Success,
        ThemeEntry::Info,
        ThemeEntry::Warn,
        ThemeEntry::Error,
        ThemeEntry::EntityTag,
        ThemeEntry::DiffAdded,
        ThemeEntry::DiffRemoved,
        ThemeEntry::DiffHeader,
        ThemeEntry::SummaryEntityName,
        ThemeEntry::SummaryOccurrences,
    ];

    fn default_color(self) -> &'static str {
        match self {
            ThemeEntry::Header | ThemeEntry::DiffHeader => "yellow",
            ThemeEntry::Success | ThemeEntry::DiffAdded => "green",
            ThemeEntry::Info => "white",
            ThemeEntry::Warn => "brightyellow",
            ThemeEntry::Error | ThemeEntry::DiffRemoved => "red",
            ThemeEntry::EntityTag => "magenta",
            ThemeEntry::SummaryEntityName => "cyan",
            ThemeEntry::SummaryOccurrences => "brightwhite",
        }
    }
}

/// A named ANSI colour such as `red` or `brightgreen`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ThemeColor(String);

#[derive(Debug, Clone)]
pub struct ParseThemeColorError(String);

impl fmt::Display for ParseThemeColorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Invalid theme color '{}'; expected one of: {}",
            self.0,
            COLOR_NAMES.join(", ")
        )
    }
}

impl std::error::Error for ParseThemeColorError {}

const COLOR_NAMES: [&str; 16] = [
    "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
    "brightblack", "brightred", "brightgreen", "brightyellow", "brightblue",
    "brightmagenta", "brightcyan", "brightwhite",
];

impl FromStr for ThemeColor {
    type Err = ParseThemeColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase().replace(['_', '-', ' '], "");
        if COLOR_NAMES.contains(&lower.as_str()) {
            Ok(ThemeColor(lower))
        } else {
            Err(ParseThemeColorError(s.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for ThemeColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl ThemeColor {
    pub fn to_ansi_color(&self) -> AnsiColors {
        match self.0.as_str() {
            "black" => AnsiColors::Black,
            "red" => AnsiColors::Red,
            "green" => AnsiColors::Green,
            "yellow" => AnsiColors::Yellow,
            "blue" => AnsiColors::Blue,
            "magenta" => AnsiColors::Magenta,
            "cyan" => AnsiColors::Cyan,
            "brightblack" => AnsiColors::BrightBlack,
            "brightred" => AnsiColors::BrightRed,
            "brightgreen" => AnsiColors::BrightGreen,
            "brightyellow" => AnsiColors::BrightYellow,
            "brightblue" => AnsiColors::BrightBlue,
            "brightmagenta" => AnsiColors::BrightMagenta,
            "brightcyan" => AnsiColors::BrightCyan,
            "brightwhite" => AnsiColors::BrightWhite,
            _ => AnsiColors::White,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeStyle {
    pub fg: Option<ThemeColor>,
}

impl ThemeStyle {
    fn named(color: &str) -> Self {
        ThemeStyle { fg: Some(ThemeColor(color.to_string())) }
    }

    /// Loads a theme file and fills in missing entries from the default theme.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ThemeMap> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read theme file {}", path.display()))?;
        let mut custom: ThemeMap = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse theme file {}", path.display()))?;

        for (entry, style) in Self::default_theme_map() {
            custom.entry(entry).or_insert(style);
        }
        Ok(custom)
    }

    pub fn default_theme_map() -> ThemeMap {
        ThemeEntry::ALL
            .iter()
            .map(|entry| (*entry, ThemeStyle::named(entry.default_color())))
            .collect()
    }
}

/// The theme from `theme_path`, or the default theme.
pub fn build_theme_map(theme_path: Option<&PathBuf>) -> Result<ThemeMap> {
    match theme_path {
        Some(path) => ThemeStyle::load_from_file(path),
        None => Ok(ThemeStyle::default_theme_map()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_named_colors() {
        assert!("red".parse::<ThemeColor>().is_ok());
        assert!("Bright-Green".parse::<ThemeColor>().is_ok());
        assert!("chartreuse".parse::<ThemeColor>().is_err());
    }

    #[test]
    fn maps_to_ansi() {
        let c: ThemeColor = "brightmagenta".parse().unwrap();
        assert_eq!(c.to_ansi_color(), AnsiColors::BrightMagenta);
    }

    #[test]
    fn default_theme_covers_every_entry() {
        let theme = ThemeStyle::default_theme_map();
        for entry in ThemeEntry::ALL {
            assert!(theme.get(&entry).and_then(|s| s.fg.as_ref()).is_some(), "{:?} missing", entry);
        }
    }

    #[test]
    fn custom_theme_is_merged_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "info:\n  fg: cyan\nentity_tag:\n  fg: brightblue").unwrap();

        let theme = build_theme_map(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(theme[&ThemeEntry::Info].fg.as_ref().unwrap().to_ansi_color(), AnsiColors::Cyan);
        assert_eq!(theme[&ThemeEntry::EntityTag].fg.as_ref().unwrap().to_ansi_color(), AnsiColors::BrightBlue);
        assert_eq!(theme[&ThemeEntry::Error].fg.as_ref().unwrap().to_ansi_color(), AnsiColors::Red);
    }

    #[test]
    fn unknown_color_in_theme_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "info:\n  fg: chartreuse").unwrap();
        assert!(ThemeStyle::load_from_file(file.path()).is_err());
    }
}
