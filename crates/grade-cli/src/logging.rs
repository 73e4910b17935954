//! Diagnostic tracing for the `grade` binary.
//!
//! Reads `RUST_LOG` (default `warn`) and writes compact lines to stderr, so
//! the report on stdout stays clean:
//!
//! ```bash
//! RUST_LOG=grade_tester=debug grade demo
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
