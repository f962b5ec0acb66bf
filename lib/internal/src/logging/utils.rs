use scoped_attributes_config::log::LoggingConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Targets, EnvFilter, Layer};

static INTERNAL_CRATES: &[&str] = &["hyper", "hyper_util", "h2", "axum", "tower", "reqwest"];

/// Silences the HTTP stack unless `internals` is set. Everything else is left to the
/// [`EnvFilter`].
pub fn create_targets_filter(internals: bool) -> Targets {
    Targets::new()
        .with_targets(
            INTERNAL_CRATES
                .iter()
                .map(|crate_name| {
                    (
                        *crate_name,
                        match internals {
                            true => LevelFilter::TRACE,
                            false => LevelFilter::OFF,
                        },
                    )
                })
                .collect::<Vec<(&str, LevelFilter)>>(),
        )
        .with_default(LevelFilter::TRACE)
}

/// Invalid directives are skipped instead of failing the startup.
pub fn create_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::builder().parse_lossy(config.env_filter_str())
}

pub type DynLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn internal_crates_are_off_by_default() {
        let filter = create_targets_filter(false);
        assert!(!filter.would_enable("hyper::proto", &Level::ERROR));
        assert!(!filter.would_enable("axum::serve", &Level::INFO));
        assert!(filter.would_enable("scoped_attributes_server", &Level::TRACE));
    }

    #[test]
    fn internal_crates_follow_the_level_when_enabled() {
        let filter = create_targets_filter(true);
        assert!(filter.would_enable("hyper::proto", &Level::DEBUG));
    }
}
