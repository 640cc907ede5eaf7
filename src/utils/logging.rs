use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::utils::timing::TIMING_TARGET;

const LOGS_DIR: &str = "logs";

pub struct LoggingGuards {
    _file_guard: WorkerGuard,
    _json_file_guard: WorkerGuard,
    _timing_guard: WorkerGuard,
}

fn parse_log_level(value: &str) -> LevelFilter {
    match value.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Installs file, JSON, timing and stderr layers. The terminal front-end owns
/// stdout, so console logs go to stderr and only at `warn` and above.
pub fn init_logging(log_level: &str) -> LoggingGuards {
    let logs_dir = Path::new(LOGS_DIR);
    if let Err(err) = fs::create_dir_all(logs_dir) {
        eprintln!("Failed to create logs directory: {err}");
    }

    let file_appender = tracing_appender::rolling::daily(logs_dir, "app.log");
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let json_file_appender = tracing_appender::rolling::daily(logs_dir, "app.jsonl");
    let (json_file_writer, json_file_guard) = tracing_appender::non_blocking(json_file_appender);

    let timing_appender = tracing_appender::rolling::daily(logs_dir, "timing.log");
    let (timing_writer, timing_guard) = tracing_appender::non_blocking(timing_appender);

    let general_level = parse_log_level(log_level);
    let general_filter = Targets::new()
        .with_default(general_level)
        .with_target(TIMING_TARGET, LevelFilter::OFF)
        .with_target("hyper", LevelFilter::WARN)
        .with_target("hyper_util", LevelFilter::WARN)
        .with_target("reqwest", LevelFilter::WARN);
    let console_filter = general_filter
        .clone()
        .with_default(general_level.min(LevelFilter::WARN));
    let timing_filter = Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target(TIMING_TARGET, LevelFilter::INFO);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(general_filter.clone());
    let json_file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(json_file_writer)
        .with_filter(general_filter);
    let timing_layer = tracing_subscriber::fmt::layer()
        .with_writer(timing_writer)
        .with_ansi(false)
        .with_filter(timing_filter);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(json_file_layer)
        .with(timing_layer)
        .with(stderr_layer)
        .init();

    LoggingGuards {
        _file_guard: file_guard,
        _json_file_guard: json_file_guard,
        _timing_guard: timing_guard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_levels_default_to_info() {
        assert_eq!(parse_log_level("verbose"), LevelFilter::INFO);
        assert_eq!(parse_log_level(" WARNING "), LevelFilter::WARN);
        assert_eq!(parse_log_level("off"), LevelFilter::OFF);
    }
}
