// swift-deps-diagram
// Main CLI entry point

use clap::Parser;
use std::process;
use swift_deps_diagram::cli::Cli;
use swift_deps_diagram::utils::error::UserError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            use clap::error::ErrorKind;
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            let _ = err.print();
            process::exit(1);
        }
    };

    init_logging(cli.diagram.verbose);

    if let Err(err) = cli.diagram.run().await {
        let user_error = UserError::from_diagram_error(&err);
        user_error.print();
        process::exit(user_error.exit_code);
    }
}

/// `RUST_LOG` wins; otherwise `info` with --verbose and `warn` without
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}
