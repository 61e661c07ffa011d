//! Logging initialization

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or
/// everything from `debug` up with `--debug`.
pub fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_target(debug)
        .without_time()
        .try_init();
}
