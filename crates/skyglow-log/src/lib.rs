//! Structured logging for Skyglow via the `tracing` ecosystem.
//!
//! Console output carries uptime timestamps and module paths. Debug builds can
//! additionally write JSON lines to a file. `RUST_LOG` wins over the configured
//! level.

use std::path::Path;

use skyglow_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "skyglow.log";

/// Resolve the filter directives from the optional config.
///
/// A bare level such as `"debug"` keeps the GPU crates at `warn`; a string that
/// already contains directives (`"info,skyglow_render=trace"`) is used verbatim.
pub fn filter_directives(config: Option<&Config>) -> String {
    match config.map(|c| c.debug.log_level.trim()) {
        Some(level) if level.is_empty() => DEFAULT_FILTER.to_string(),
        Some(level) if level.contains(',') || level.contains('=') => level.to_string(),
        Some(level) => format!("{level},wgpu=warn,naga=warn"),
        None => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (only used when `debug_build`)
/// * `debug_build` - enables the file layer
/// * `config` - supplies the log level override
///
/// Calling this twice is harmless: the second registration is ignored.
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        let _ = subscriber.with(file_layer).try_init();
        return;
    }

    let _ = subscriber.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_without_config() {
        let filter = filter_directives(None);
        assert_eq!(filter, DEFAULT_FILTER);
        assert!(EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn test_bare_level_keeps_gpu_quiet() {
        let mut config = Config::default();
        config.debug.log_level = "debug".to_string();
        let filter = filter_directives(Some(&config));
        assert!(filter.starts_with("debug"));
        assert!(filter.contains("wgpu=warn"));
        assert!(filter.contains("naga=warn"));
    }

    #[test]
    fn test_directive_string_used_verbatim() {
        let mut config = Config::default();
        config.debug.log_level = "warn,skyglow_render=trace".to_string();
        assert_eq!(
            filter_directives(Some(&config)),
            "warn,skyglow_render=trace"
        );
    }

    #[test]
    fn test_empty_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_directives(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_resolved_filters_parse() {
        for level in ["error", "info", "trace", "info,skyglow_app=debug"] {
            let mut config = Config::default();
            config.debug.log_level = level.to_string();
            let filter = filter_directives(Some(&config));
            assert!(
                EnvFilter::try_new(&filter).is_ok(),
                "Failed to parse filter: {filter}"
            );
        }
    }

    #[test]
    fn test_init_writes_log_file_in_debug_builds() {
        let temp_dir = tempfile::tempdir().unwrap();
        init_logging(Some(temp_dir.path()), true, None);
        tracing::info!("log file check");
        assert!(temp_dir.path().join(LOG_FILE_NAME).exists());
    }
}
