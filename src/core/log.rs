use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. When `RUST_LOG` is set it is the only
/// filter; otherwise the crate and `tower_http` log at `info` (or `debug`
/// when verbose) and everything else at `warn`.
pub fn init_logging(verbose: bool) {
    subscriber(verbose, EnvFilter::try_from_default_env().ok()).init();
}

fn default_targets(verbose: bool) -> Targets {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    Targets::new()
        .with_target("emasbot", level)
        .with_target("tower_http", level)
        .with_default(LevelFilter::WARN)
}

fn subscriber(verbose: bool, env_filter: Option<EnvFilter>) -> impl Subscriber + Send + Sync {
    let app_filter = env_filter.is_none().then(|| default_targets(verbose));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(app_filter)
        .with(env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    fn debug_enabled(verbose: bool, env_filter: Option<EnvFilter>) -> (bool, bool) {
        tracing::subscriber::with_default(subscriber(verbose, env_filter), || {
            (
                tracing::enabled!(target: "emasbot::core::aggregate", Level::DEBUG),
                tracing::enabled!(target: "hyper::proto", Level::INFO),
            )
        })
    }

    #[test]
    fn test_rust_log_raises_crate_level() {
        let (crate_debug, _) = debug_enabled(false, Some(EnvFilter::new("emasbot=debug")));
        assert!(crate_debug);
    }

    #[test]
    fn test_defaults_without_rust_log() {
        assert_eq!(debug_enabled(false, None), (false, false));
        assert_eq!(debug_enabled(true, None), (true, false));
    }
}
