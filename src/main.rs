use clap::Parser;
use migration_parity::cli::commands::{self, CommandContext};
use migration_parity::cli::{Cli, Commands};
use migration_parity::config::CliOverrides;
use migration_parity::logging::init_logging;
use migration_parity::{ParityError, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.json) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let ctx = CommandContext {
        overrides: build_cli_overrides(&cli),
        config_path: cli.config.clone(),
        json: cli.json,
        quiet: cli.quiet,
    };

    let result = match &cli.command {
        Commands::Diff(args) => commands::diff::execute(args, &ctx),
        Commands::Bench(args) => commands::bench::execute(args, &ctx),
        Commands::BenchCheck(args) => commands::bench_check::execute(args, &ctx),
        Commands::Normalize(args) => commands::normalize::execute(args, &ctx),
        Commands::Fixtures(args) => commands::fixtures::execute(args, &ctx),
        Commands::Version => commands::version::execute(&ctx),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => handle_error(&e, cli.json),
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &ParityError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> CliOverrides {
    let mut overrides = CliOverrides::default();
    overrides.set_path("repo-root", cli.repo_root.as_deref());
    overrides
}
