use std::sync::Once;

use env_logger::Env;
use log::LevelFilter;

static RUST_LOG_ONCE: Once = Once::new();

fn env_level() -> LevelFilter {
    std::env::var("ACCEL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .as_deref()
        .and_then(parse_level)
        .unwrap_or(LevelFilter::Info)
}

fn level_to_str(level: LevelFilter) -> &'static str {
    match level {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}

fn parse_level(input: &str) -> Option<LevelFilter> {
    input.trim().parse::<LevelFilter>().ok()
}

fn raise(level: LevelFilter, steps: u8) -> LevelFilter {
    (0..steps).fold(level, |level, _| match level {
        LevelFilter::Off | LevelFilter::Error => LevelFilter::Warn,
        LevelFilter::Warn => LevelFilter::Info,
        LevelFilter::Info => LevelFilter::Debug,
        LevelFilter::Debug | LevelFilter::Trace => LevelFilter::Trace,
    })
}

/// Initialize stderr logging based on `ACCEL_LOG`/`RUST_LOG` (default `info`).
///
/// With `verbose > 0` the level from the environment is raised one step per
/// count and applied to every module. Safe to call more than once.
pub fn init_logging(verbose: u8) {
    RUST_LOG_ONCE.call_once(|| {
        let mut builder = if verbose == 0 {
            let fallback = std::env::var("RUST_LOG")
                .unwrap_or_else(|_| level_to_str(LevelFilter::Info).to_string());
            env_logger::Builder::from_env(Env::new().filter_or("ACCEL_LOG", fallback))
        } else {
            let mut builder = env_logger::Builder::new();
            builder.filter_level(raise(env_level(), verbose));
            builder
        };
        builder
            .format_timestamp_millis()
            .format_module_path(true)
            .format_target(true)
            .init();
    });
}
