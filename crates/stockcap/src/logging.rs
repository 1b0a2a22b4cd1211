//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem for structured logging with support for
//! both human-readable and JSON output formats.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `default_level` - Filter used when `RUST_LOG` is not set.
/// * `json_format` - If true, outputs structured JSON logs; otherwise pretty-printed.
///
/// # Notes
///
/// - Log output goes to stderr so progress bars and prompts stay readable
/// - The RUST_LOG environment variable can override the log level
pub fn init(default_level: &str, json_format: bool) {
    // Build the filter, respecting RUST_LOG if set
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        // JSON format for machine parsing
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty format for humans
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Pick the default filter level from config and the `--verbose` flag.
fn level_for(config_level: &str, verbose: bool) -> &'static str {
    if verbose {
        return "debug";
    }
    match config_level.to_lowercase().as_str() {
        "error" => "error",
        "warn" | "warning" => "warn",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    }
}

/// Initialize logging with configuration from Config.
///
/// CLI flags win over the `[logging]` section.
pub fn init_from_config(
    config: &stockcap_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = level_for(&config.logging.level, verbose_override);
    let json_format = json_logs_override || config.logging.format == "json";
    init(level, json_format);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_forces_debug() {
        assert_eq!(level_for("warn", true), "debug");
    }

    #[test]
    fn config_level_is_respected() {
        assert_eq!(level_for("WARN", false), "warn");
        assert_eq!(level_for("trace", false), "trace");
        assert_eq!(level_for("bogus", false), "info");
    }
}
