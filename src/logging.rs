//! Tracing subscriber setup
//!
//! Log lines go to stderr so command output on stdout stays scriptable.
//! A non-empty `RUST_LOG` replaces the configured level; `--verbose` still
//! raises `estate` to debug on top of it.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber.
///
/// Only the first call has an effect.
pub fn init_tracing(configured: &str, verbose: bool) {
    TRACING_INIT.call_once(|| {
        let rust_log = std::env::var("RUST_LOG").ok();
        let filter = build_filter(rust_log.as_deref(), configured, verbose);

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

/// Filter from `RUST_LOG` when it parses, else `estate=<level>`
pub fn build_filter(rust_log: Option<&str>, configured: &str, verbose: bool) -> EnvFilter {
    let from_env = rust_log
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok());

    match from_env {
        Some(filter) if verbose => match "estate=debug".parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        },
        Some(filter) => filter,
        None => {
            let level = effective_level(configured, verbose);
            EnvFilter::try_new(format!("estate={}", level))
                .unwrap_or_else(|_| EnvFilter::new("estate=info"))
        }
    }
}

/// Level to use given the configured level and the `--verbose` flag
pub fn effective_level(configured: &str, verbose: bool) -> &str {
    if verbose {
        "debug"
    } else {
        configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_effective_level() {
        assert_eq!(effective_level("warn", false), "warn");
        assert_eq!(effective_level("warn", true), "debug");
    }

    #[test]
    fn test_configured_level_without_env() {
        let filter = build_filter(None, "warn", false);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = build_filter(Some("  "), "error", false);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_rust_log_wins_over_configured_level() {
        let filter = build_filter(Some("estate=trace"), "warn", false);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));

        let filter = build_filter(Some("estate=error"), "debug", false);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_verbose_raises_quiet_rust_log() {
        let filter = build_filter(Some("estate=error"), "info", true);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_bad_level_falls_back_to_info() {
        let filter = build_filter(None, "not a level", false);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing("info", false);
        init_tracing("not a level", true);
    }
}
