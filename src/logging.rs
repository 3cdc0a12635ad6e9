//! Diagnostic logging on stderr.
//!
//! Operator-facing output goes through `println!`; tracing is for diagnostics
//! and stays at `warn` unless asked otherwise. `RUST_LOG` overrides the
//! configured filter:
//! ```bash
//! RUST_LOG=debug codeassist .
//! codeassist . --log-level codeassist=info
//! ```

use std::sync::Once;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: Once = Once::new();

/// Install the subscriber. Only the first call has an effect.
pub fn init(filter: &str) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}
