use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "MDNAV_LOG";

/// Installs the stderr subscriber. Verbosity comes from `MDNAV_LOG`
/// (`error`, `warn`, `info`, `debug`, `trace` or `off`), defaulting to info.
pub fn init() {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|raw| parse_level(&raw))
        .unwrap_or(LevelFilter::INFO);

    let subscriber = tracing_subscriber::registry().with(level).with(
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr),
    );

    let _ = subscriber.try_init();
}

pub fn parse_level(raw: &str) -> Option<LevelFilter> {
    raw.trim().parse().ok()
}
