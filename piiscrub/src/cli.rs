// piiscrub/src/cli.rs
//! This file defines the command-line interface (CLI) for the piiscrub application,
//! including all available commands and their arguments.
//! License: MIT OR Apache-2.0

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "piiscrub",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Remove personal data from text before it is sent to an LLM",
    long_about = "piiscrub detects personally identifiable information (names, e-mail addresses, phone numbers, card numbers, national identifiers and more) in free text and replaces it with entity tags, masks, hashes or reversible placeholders. Reversible placeholders are stored in a mapping file so that model output can be restored afterwards.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Specify the path to a custom YAML theme file.
    #[arg(long = "theme", value_name = "FILE", global = true, help = "Specify the path to a custom YAML theme file.")]
    pub theme: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `piiscrub` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Replaces detected PII in a file or stdin.")]
    Sanitize(SanitizeCommand),

    #[command(about = "Lists detected PII without changing the input.")]
    Analyze(AnalyzeCommand),

    #[command(about = "Replaces detected PII with reversible placeholders and saves the mapping.")]
    Pseudonymize(PseudonymizeCommand),

    #[command(about = "Restores original values from placeholders using a mapping file.")]
    Deanonymize(DeanonymizeCommand),

    #[command(about = "Asks an LLM to propose custom recognizers for a sample text.")]
    Suggest(SuggestCommand),

    #[command(subcommand, about = "Lists, signs and verifies anonymization policies.")]
    Policies(PoliciesCommand),
}

/// Options shared by every command that runs the analyzer.
#[derive(Args, Debug, Clone, Default)]
pub struct DetectionArgs {
    /// Path to a custom recognizer configuration file (YAML).
    #[arg(long = "config", value_name = "FILE", help = "Path to a custom recognizer configuration file (YAML), merged over the built-in rules.")]
    pub config: Option<PathBuf>,

    /// Loads a named policy or a policy file.
    #[arg(long = "policy", value_name = "NAME", help = "Load a named policy from the policy directories, or a policy file path.")]
    pub policy: Option<String>,

    /// Only detect these entity types (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "ENTITIES", help = "Only detect these entity types (comma-separated), e.g. PERSON,EMAIL_ADDRESS.")]
    pub entities: Vec<String>,

    /// Drop detections scoring below this value.
    #[arg(long = "score-threshold", value_name = "SCORE", help = "Drop detections scoring below this value (0.0 - 1.0).")]
    pub score_threshold: Option<f64>,

    /// Enable these rule names, including opt-in rules (comma-separated).
    #[arg(long, short = 'e', value_delimiter = ',', help = "Enable these rule names, including opt-in rules (comma-separated).")]
    pub enable: Vec<String>,

    /// Disable these rule names (comma-separated).
    #[arg(long, short = 'x', value_delimiter = ',', help = "Disable these rule names (comma-separated).")]
    pub disable: Vec<String>,

    /// Values that are never reported (comma-separated).
    #[arg(long = "allow", value_delimiter = ',', value_name = "VALUES", help = "Values that are never reported (comma-separated).")]
    pub allow: Vec<String>,
}

/// Arguments for the `sanitize` command.
#[derive(Parser, Debug)]
pub struct SanitizeCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Write sanitized output to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Apply this operator to every entity type.
    #[arg(long, value_enum, help = "Apply this operator to every entity type, overriding configured operators.")]
    pub operator: Option<OperatorChoice>,

    /// Show a unified diff to highlight the changes made.
    #[arg(long, short = 'D', help = "Show a unified diff to highlight the changes made.")]
    pub diff: bool,

    /// Process input line by line (useful for streaming data from pipes).
    #[arg(long = "line-buffered", conflicts_with = "diff", help = "Process input line by line (useful for streaming data from pipes).")]
    pub line_buffered: bool,

    /// Suppress the summary.
    #[arg(long = "no-summary", help = "Suppress the per-entity summary printed to stderr.")]
    pub no_summary: bool,
}

/// Arguments for the `analyze` command.
#[derive(Parser, Debug)]
pub struct AnalyzeCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Print results as JSON instead of a table.
    #[arg(long, help = "Print results as a JSON array instead of a table.")]
    pub json: bool,
}

/// Arguments for the `pseudonymize` command.
#[derive(Parser, Debug)]
pub struct PseudonymizeCommand {
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    /// JSON file holding placeholder mappings. Created if missing.
    #[arg(long, short = 'm', value_name = "FILE", help = "JSON mapping file; created if it does not exist and updated in place.")]
    pub mapping: PathBuf,

    /// Placeholder template with {entity_type} and {index}.
    #[arg(long, value_name = "TEMPLATE", help = "Placeholder template using {entity_type} and {index}. Defaults to [{entity_type}_{index}].")]
    pub format: Option<String>,

    #[command(flatten)]
    pub detection: DetectionArgs,

    #[arg(long = "no-summary", help = "Suppress the per-entity summary printed to stderr.")]
    pub no_summary: bool,
}

/// Arguments for the `deanonymize` command.
#[derive(Parser, Debug)]
pub struct DeanonymizeCommand {
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    #[arg(long, short = 'm', value_name = "FILE", help = "JSON mapping file written by `pseudonymize`.")]
    pub mapping: PathBuf,

    /// Must match the template used when pseudonymizing.
    #[arg(long, value_name = "TEMPLATE", help = "Placeholder template used when pseudonymizing, if it was not the default.")]
    pub format: Option<String>,
}

/// Arguments for the `suggest` command.
#[derive(Parser, Debug)]
pub struct SuggestCommand {
    #[arg(long, short = 'i', value_name = "FILE", help = "Read the sample text from a file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Write the suggested rules as a config file usable with `--config`.
    #[arg(long = "write-config", value_name = "FILE", help = "Write the suggested rules as a YAML config usable with --config.")]
    pub write_config: Option<PathBuf>,

    #[arg(long, value_name = "MODEL", default_value = piiscrub_core::suggest::DEFAULT_MODEL, help = "Gemini model to query.")]
    pub model: String,

    #[arg(long = "base-url", value_name = "URL", env = "PIISCRUB_SUGGEST_BASE_URL", default_value = piiscrub_core::suggest::DEFAULT_BASE_URL, help = "Base URL of the Gemini API.")]
    pub base_url: String,
}

/// Subcommands for the `policies` command.
#[derive(Subcommand, Debug)]
pub enum PoliciesCommand {
    #[command(about = "Lists policies found in the policy directories.")]
    List,
    #[command(about = "Signs a policy YAML file in place with a hex key read from a file.")]
    Sign {
        #[arg(value_name = "FILE", help = "The policy YAML file to sign.")]
        path: PathBuf,
        #[arg(long = "key", value_name = "KEY_FILE", help = "File containing the hex-encoded HMAC key.")]
        key_file: PathBuf,
    },
    #[command(about = "Verifies the signature of a policy YAML file.")]
    Verify {
        #[arg(value_name = "FILE", help = "The policy YAML file to verify.")]
        path: PathBuf,
        #[arg(long = "key", value_name = "KEY_FILE", help = "File containing the hex-encoded HMAC key.")]
        key_file: PathBuf,
    },
}

/// Operators selectable from the command line.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OperatorChoice {
    /// Replace with `<ENTITY_TYPE>`.
    Replace,
    /// Remove the value entirely.
    Redact,
    /// Overwrite every character with `*`.
    Mask,
    /// SHA-256 hex digest of the value.
    Hash,
    /// Leave the value in place.
    Keep,
}

impl OperatorChoice {
    pub fn name(self) -> &'static str {
        match self {
            OperatorChoice::Replace => "replace",
            OperatorChoice::Redact => "redact",
            OperatorChoice::Mask => "mask",
            OperatorChoice::Hash => "hash",
            OperatorChoice::Keep => "keep",
        }
    }
}
