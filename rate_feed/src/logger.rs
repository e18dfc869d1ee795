use env_logger::{Builder, Env};

/// Initialise the process-wide logger. `RUST_LOG` overrides the default `info` filter.
pub fn init_logger() {
    let env = Env::default().default_filter_or("info");
    // A second call (tests, embedding) keeps the first logger.
    let _ = Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
