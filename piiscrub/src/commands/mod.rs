// piiscrub/src/commands/mod.rs
//! Command implementations and the plumbing they share: input and output,
//! configuration assembly and themed messages.

pub mod analyze;
pub mod policies;
pub mod pseudonymize;
pub mod sanitize;
pub mod suggest;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::debug;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use piiscrub_core::{
    apply_policy_to_config, load_policy_by_name, merge_rules, AnalyzeRequest, Policy, ScrubConfig,
};

use crate::cli::DetectionArgs;
use crate::ui::output_format;
use crate::ui::theme::ThemeMap;

pub fn info_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let colors = io::stderr().is_terminal();
    let _ = output_format::print_info_message(&mut io::stderr(), msg.as_ref(), theme, colors);
}

pub fn success_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let colors = io::stderr().is_terminal();
    let _ = output_format::print_success_message(&mut io::stderr(), msg.as_ref(), theme, colors);
}

pub fn warn_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let colors = io::stderr().is_terminal();
    let _ = output_format::print_warn_message(&mut io::stderr(), msg.as_ref(), theme, colors);
}

/// Reads the whole input file, or stdin when no file is given.
pub fn read_input(input_file: Option<&PathBuf>) -> Result<String> {
    match input_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

/// Writes `content` to the output file, or to stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write output file {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            writer.write_all(content.as_bytes()).context("Failed to write to stdout")?;
            writer.flush().context("Failed to flush stdout")
        }
    }
}

/// Loaded configuration plus the request that goes with it.
pub struct Detection {
    pub config: ScrubConfig,
    pub request: AnalyzeRequest,
    pub policy: Option<Policy>,
}

/// Builds the effective configuration.
///
/// Layers, later winning: built-in rules, `--config`, `--policy`, then the
/// individual command-line flags.
pub fn build_detection(args: &DetectionArgs) -> Result<Detection> {
    let defaults = ScrubConfig::load_default_rules()?;
    let user = args
        .config
        .as_deref()
        .map(ScrubConfig::load_from_file)
        .transpose()?;
    let mut config = merge_rules(defaults, user);

    let policy = match args.policy.as_deref() {
        Some(name) => {
            let policy = load_policy_by_name(name)
                .with_context(|| format!("Failed to load policy '{}'", name))?;
            policy.validate(&config)?;
            config = apply_policy_to_config(&policy, config);
            Some(policy)
        }
        None => None,
    };

    config.set_active_rules(&args.enable, &args.disable);
    config.validate()?;

    let mut request = policy
        .as_ref()
        .map(Policy::analyze_request)
        .unwrap_or_default();
    if !args.entities.is_empty() {
        request = request.with_entities(args.entities.iter().map(|e| e.trim().to_string()).collect());
    }
    if let Some(threshold) = args.score_threshold {
        anyhow::ensure!(
            (0.0..=1.0).contains(&threshold),
            "--score-threshold {} is outside [0, 1]",
            threshold
        );
        request = request.with_score_threshold(threshold);
    }
    if !args.allow.is_empty() {
        let mut allow_list = request.allow_list.clone();
        allow_list.extend(args.allow.iter().cloned());
        request = request.with_allow_list(allow_list);
    }

    debug!(
        "Effective configuration: {} rules, {} operators, entities={:?}",
        config.rules.len(),
        config.operators.len(),
        request.entities
    );
    Ok(Detection { config, request, policy })
}

/// Reads a hex-encoded key from a file.
pub fn read_key_file(path: &Path) -> Result<Vec<u8>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    hex::decode(raw.trim())
        .with_context(|| format!("Key file {} does not contain a hex-encoded key", path.display()))
}
