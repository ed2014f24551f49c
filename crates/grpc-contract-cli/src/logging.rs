//! Subscriber setup for the CLI

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber. `RUST_LOG` wins over `level`; an unparsable
/// level falls back to `info`.
pub fn init(level: &str) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter(env.as_deref(), level))
        .try_init();
}

fn filter(env: Option<&str>, level: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
