// piiscrub/src/commands/suggest.rs
//! `piiscrub suggest`: ask an LLM for custom recognizers.

use anyhow::{Context, Result};
use log::info;
use std::collections::BTreeMap;
use std::fs;

use piiscrub_core::{suggestions_to_rules, AnalysisSettings, ScrubConfig, SuggestClient, SuggestConfig};

use crate::cli::SuggestCommand;
use crate::commands::{info_msg, read_input, success_msg, warn_msg, write_output};
use crate::ui::theme::ThemeMap;

pub fn run_suggest(opts: SuggestCommand, quiet: bool, theme: &ThemeMap) -> Result<()> {
    let config = SuggestConfig::from_env()?
        .with_model(opts.model.as_str())
        .with_base_url(opts.base_url.as_str());
    let text = read_input(opts.input_file.as_ref())?;

    if !quiet {
        info_msg(format!("Asking {} for recognizer suggestions...", config.model), theme);
    }
    let client = SuggestClient::new(config)?;
    let suggestions = client.suggest(&text).context("Failed to get suggestions")?;
    let rules = suggestions_to_rules(&suggestions);
    info!("Received {} suggestions, {} usable.", suggestions.len(), rules.len());

    if rules.is_empty() {
        if !quiet {
            warn_msg("The model did not suggest any usable recognizers.", theme);
        }
        return Ok(());
    }

    let suggested = ScrubConfig {
        rules,
        operators: BTreeMap::new(),
        analysis: AnalysisSettings::default(),
    };
    suggested
        .validate()
        .context("Suggested recognizers failed validation")?;
    let yaml = serde_yml::to_string(&suggested).context("Failed to serialize suggested recognizers")?;

    match &opts.write_config {
        Some(path) => {
            fs::write(path, &yaml)
                .with_context(|| format!("Failed to write config file {}", path.display()))?;
            if !quiet {
                success_msg(
                    format!("Wrote {} recognizers to {}. Use it with --config.", suggested.rules.len(), path.display()),
                    theme,
                );
            }
            Ok(())
        }
        None => write_output(None, &yaml),
    }
}
