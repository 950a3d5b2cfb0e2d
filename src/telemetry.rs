//! Logging initialization.
//!
//! Controlled by `MINIVC_LOG`, an `EnvFilter` directive such as `debug` or
//! `minivc=info`. Unset or empty leaves logging off. Events go to stderr so
//! they never mix with command output.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "MINIVC_LOG";

pub fn init() {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let filter = match std::env::var(LOG_ENV_VAR).ok().as_deref() {
        None | Some("") => return,
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("warning: ignoring invalid {LOG_ENV_VAR}: {e}");
            EnvFilter::new("warn")
        }),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
