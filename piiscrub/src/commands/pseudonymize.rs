// piiscrub/src/commands/pseudonymize.rs
//! `piiscrub pseudonymize` and `piiscrub deanonymize`.
//!
//! Both commands share a JSON mapping file. Pseudonymizing adds to it;
//! deanonymizing only reads it.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::info;
use std::io;

use piiscrub_core::{pseudonymize_text, FileMappingStore, Pseudonymizer};

use crate::cli::{DeanonymizeCommand, PseudonymizeCommand};
use crate::commands::{build_detection, info_msg, read_input, write_output, Detection};
use crate::ui::summary;
use crate::ui::theme::ThemeMap;

fn open_pseudonymizer(mapping: &std::path::Path, format: Option<&str>) -> Result<Pseudonymizer> {
    let store = FileMappingStore::open(mapping)
        .with_context(|| format!("Failed to open mapping file {}", mapping.display()))?;
    let pseudonymizer = Pseudonymizer::new(Box::new(store));
    match format {
        Some(template) => pseudonymizer
            .with_format(template)
            .with_context(|| format!("Invalid placeholder format '{}'", template)),
        None => Ok(pseudonymizer),
    }
}

pub fn run_pseudonymize(opts: PseudonymizeCommand, quiet: bool, theme: &ThemeMap) -> Result<()> {
    let Detection { config, request, policy } = build_detection(&opts.detection)?;
    let format = opts
        .format
        .clone()
        .or_else(|| policy.and_then(|p| p.pseudonym_format));

    let mut pseudonymizer = open_pseudonymizer(&opts.mapping, format.as_deref())?;
    let input = read_input(opts.input_file.as_ref())?;

    let result = pseudonymize_text(&config, &request, &input, &mut pseudonymizer)?;
    pseudonymizer
        .flush()
        .with_context(|| format!("Failed to save mapping file {}", opts.mapping.display()))?;
    info!(
        "Pseudonymized {} spans; mapping file holds {} entries.",
        result.items.len(),
        pseudonymizer.store().mappings().len()
    );

    write_output(opts.output.as_ref(), &result.text)?;

    if !quiet {
        info_msg(format!("Mappings saved to {}", opts.mapping.display()), theme);
        if !opts.no_summary {
            let colors = io::stderr().is_terminal();
            summary::print_summary(&result.summary(), &mut io::stderr(), theme, colors)?;
        }
    }
    Ok(())
}

pub fn run_deanonymize(opts: DeanonymizeCommand) -> Result<()> {
    anyhow::ensure!(
        opts.mapping.is_file(),
        "Mapping file {} does not exist",
        opts.mapping.display()
    );
    let pseudonymizer = open_pseudonymizer(&opts.mapping, opts.format.as_deref())?;
    let input = read_input(opts.input_file.as_ref())?;

    let restored = pseudonymizer
        .deanonymize(&input)
        .context("Failed to restore placeholders")?;
    write_output(opts.output.as_ref(), &restored)
}
