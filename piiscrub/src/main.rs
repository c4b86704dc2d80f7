// piiscrub/src/main.rs
//! piiscrub entry point.
//!
//! Parses arguments, sets up logging and hands off to the selected command.

use clap::Parser;
use is_terminal::IsTerminal;
use log::LevelFilter;

use piiscrub::cli::{Cli, Commands};
use piiscrub::commands;
use piiscrub::logger;
use piiscrub::ui::output_format;
use piiscrub::ui::theme::{build_theme_map, ThemeStyle};

fn main() {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.quiet {
        Some(LevelFilter::Off)
    } else if cli.debug {
        Some(LevelFilter::Debug)
    } else {
        None
    };
    logger::init_logger(level);

    if let Err(e) = run(cli) {
        let theme = ThemeStyle::default_theme_map();
        let colors = std::io::stderr().is_terminal();
        let _ = output_format::print_error_message(&mut std::io::stderr(), &format!("{:#}", e), &theme, colors);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let theme_map = build_theme_map(cli.theme.as_ref())?;

    match cli.command {
        Commands::Sanitize(opts) => commands::sanitize::run_sanitize(opts, cli.quiet, &theme_map),
        Commands::Analyze(opts) => commands::analyze::run_analyze(opts, &theme_map),
        Commands::Pseudonymize(opts) => commands::pseudonymize::run_pseudonymize(opts, cli.quiet, &theme_map),
        Commands::Deanonymize(opts) => commands::pseudonymize::run_deanonymize(opts),
        Commands::Suggest(opts) => commands::suggest::run_suggest(opts, cli.quiet, &theme_map),
        Commands::Policies(cmd) => commands::policies::run_policies(cmd, cli.quiet, &theme_map),
    }
}
