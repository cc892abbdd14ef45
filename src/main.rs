//! VU Load Tester - command-line entry point

use clap::Parser;
use std::process::ExitCode;
use vu_load_tester::{app::App, cli::Cli, error::ErrorReporter, AppError};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose);

    match App::new(cli).run().await {
        Ok(code) => code,
        Err(e) => {
            reporter.report_error(&e);
            print_error_suggestions(&e);
            ExitCode::from(e.exit_code().clamp(1, 255) as u8)
        }
    }
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Thresholds look like http_req_duration:p(95)<500 or http_req_failed:rate<0.01");
            eprintln!("  - The target URL must start with http:// or https://");
            eprintln!("  - vus and duration must be greater than zero");
        }
        AppError::Io(_) => {
            eprintln!();
            eprintln!("File help:");
            eprintln!("  - Check that the scenario file exists and is readable");
            eprintln!("  - Check that the summary export directory exists");
        }
        _ => {}
    }
}
