use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use covid_cases::cli::{self, Args};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.to_config() {
        Ok(mut config) => {
            config.report.color &= console::colors_enabled();
            cli::run(&args, &config, std::io::stdout()).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", cli::failure_message(&e));
            tracing::debug!(code = e.error_code(), "run failed");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Log to stderr; `warn` by default, crate debug output with `--verbose`,
/// `RUST_LOG` overrides both
fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,covid_cases=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
