// piiscrub/src/commands/analyze.rs
//! `piiscrub analyze`: report detections without rewriting the text.

use anyhow::{Context, Result};
use serde::Serialize;

use piiscrub_core::{AnalyzerEngine, RecognizerResult};

use crate::cli::AnalyzeCommand;
use crate::commands::{build_detection, read_input, success_msg, write_output, Detection};
use crate::ui::summary::analysis_table;
use crate::ui::theme::ThemeMap;

#[derive(Serialize)]
struct Detected<'a> {
    entity_type: &'a str,
    start: usize,
    end: usize,
    score: f64,
    recognizer: &'a str,
    text: &'a str,
}

pub fn run_analyze(opts: AnalyzeCommand, theme: &ThemeMap) -> Result<()> {
    let Detection { config, request, .. } = build_detection(&opts.detection)?;
    let input = read_input(opts.input_file.as_ref())?;

    let analyzer = AnalyzerEngine::new(&config)?;
    let results = analyzer.analyze(&input, &request).context("Failed to analyze input")?;

    if opts.json {
        let json = serde_json::to_string_pretty(&to_detected(&input, &results))
            .context("Failed to serialize results")?;
        return write_output(None, &format!("{}\n", json));
    }

    if results.is_empty() {
        success_msg("No PII detected.", theme);
        return Ok(());
    }
    write_output(None, &format!("{}\n", analysis_table(&input, &results)))
}

fn to_detected<'a>(text: &'a str, results: &'a [RecognizerResult]) -> Vec<Detected<'a>> {
    results
        .iter()
        .map(|r| Detected {
            entity_type: &r.entity_type,
            start: r.start,
            end: r.end,
            score: r.score,
            recognizer: &r.recognizer_name,
            text: r.matched_text(text).unwrap_or(""),
        })
        .collect()
}
