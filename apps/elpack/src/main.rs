//! # elpack
//!
//! Inspect e-learning packages from the command line.
//!
//! ## Usage
//!
//! ```bash
//! elpack detect ./course
//! elpack inspect ./course --json
//! elpack launch ./course
//! elpack prereq "A1 & (A2 | ~A3)" --completed A1,A2
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // ELPACK_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ELPACK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "elpack=info,elpack_core=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = elpack::cli::Cli::parse();

    if let Err(e) = elpack::cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
