//! audiometa CLI entry point

use audiometa::config::{Cli, Settings};
use audiometa::report::emit;
use audiometa::{pipeline, AudiometaError};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli);

    // Usage and missing-file answers go to stdout, matching the report channel
    let Some(file) = cli.file.as_deref() else {
        let usage = serde_json::json!({ "error": AudiometaError::MissingArgument.to_string() });
        println!("{}", usage);
        return ExitCode::FAILURE;
    };
    if !file.exists() {
        println!("File does not exist.");
        return ExitCode::FAILURE;
    }

    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = match pipeline::run(file, &settings) {
        Ok(report) => report,
        Err(AudiometaError::FileNotFound(_)) => {
            println!("File does not exist.");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stdout = std::io::stdout();
    if let Err(e) = emit::emit(&report, &mut stdout.lock(), &settings.output) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn init_logging(cli: &Cli) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
