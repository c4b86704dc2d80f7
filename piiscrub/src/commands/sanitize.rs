// piiscrub/src/commands/sanitize.rs
//! `piiscrub sanitize`: replace detected PII and write the result.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};

use piiscrub_core::{
    AnalyzerEngine, AnonymizerEngine, EngineResult, EntitySummaryItem, OperatorConfig, DEFAULT_OPERATOR_KEY,
};

use crate::cli::SanitizeCommand;
use crate::commands::{build_detection, info_msg, read_input, write_output, Detection};
use crate::ui::theme::ThemeMap;
use crate::ui::{diff_viewer, output_format, summary};

pub fn run_sanitize(opts: SanitizeCommand, quiet: bool, theme: &ThemeMap) -> Result<()> {
    info!("Starting sanitize operation.");
    let Detection { mut config, request, .. } = build_detection(&opts.detection)?;

    if let Some(choice) = opts.operator {
        let operator = OperatorConfig::from_name(choice.name())
            .with_context(|| format!("Unknown operator '{}'", choice.name()))?;
        debug!("Overriding every operator with '{}'.", operator.name());
        config.operators = BTreeMap::from([(DEFAULT_OPERATOR_KEY.to_string(), operator)]);
    }

    let analyzer = AnalyzerEngine::new(&config)?;
    let anonymizer = AnonymizerEngine::new();
    let sanitize = |text: &str| -> Result<EngineResult> {
        let results = analyzer.analyze(text, &request).context("Failed to analyze input")?;
        anonymizer
            .anonymize(text, &results, &config.operators)
            .context("Failed to anonymize input")
    };

    let summary_items = if opts.line_buffered {
        run_line_buffered(&opts, &sanitize)?
    } else {
        let input = read_input(opts.input_file.as_ref())?;
        let result = sanitize(&input)?;
        debug!("Sanitized {} bytes into {} bytes.", input.len(), result.text.len());

        if opts.diff {
            write_diff(&opts, &input, &result.text, theme)?;
        } else {
            match &opts.output {
                Some(path) => {
                    info_msg(format!("Writing sanitized content to file: {}", path.display()), theme);
                    write_output(Some(path), &result.text)?;
                }
                None => {
                    let colors = io::stdout().is_terminal();
                    let shown = output_format::highlight_entities(&result.text, &result.items, theme, colors);
                    write_output(None, &shown)?;
                }
            }
        }
        result.summary()
    };

    if !opts.no_summary && !quiet {
        let colors = io::stderr().is_terminal();
        summary::print_summary(&summary_items, &mut io::stderr(), theme, colors)?;
    }

    info!("Sanitize operation completed.");
    Ok(())
}

/// Sanitizes and emits one line at a time, flushing after each.
fn run_line_buffered(
    opts: &SanitizeCommand,
    sanitize: &dyn Fn(&str) -> Result<EngineResult>,
) -> Result<Vec<EntitySummaryItem>> {
    let reader: Box<dyn BufRead> = match &opts.input_file {
        Some(path) => Box::new(io::BufReader::new(
            fs::File::open(path).with_context(|| format!("Failed to open input file {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let mut writer: Box<dyn Write> = match &opts.output {
        Some(path) => Box::new(
            fs::File::create(path).with_context(|| format!("Failed to create output file {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for line in reader.lines() {
        let line = line.context("Failed to read input line")?;
        let result = sanitize(&line)?;
        for item in result.summary() {
            *counts.entry(item.entity_type).or_default() += item.occurrences;
        }
        writeln!(writer, "{}", result.text).context("Failed to write output line")?;
        writer.flush().context("Failed to flush output")?;
    }

    Ok(counts
        .into_iter()
        .map(|(entity_type, occurrences)| EntitySummaryItem { entity_type, occurrences })
        .collect())
}

fn write_diff(opts: &SanitizeCommand, original: &str, sanitized: &str, theme: &ThemeMap) -> Result<()> {
    match &opts.output {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            diff_viewer::print_diff(original, sanitized, &mut file, theme, false)?;
        }
        None => {
            let stdout = io::stdout();
            let colors = stdout.is_terminal();
            diff_viewer::print_diff(original, sanitized, &mut stdout.lock(), theme, colors)?;
        }
    }
    Ok(())
}
