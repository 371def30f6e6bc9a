//! Tracing setup (spec.md SPEC_FULL.md §2.1), grounded on `rpglotd`'s
//! `init_logging` level mapping. The dashboard owns the alternate screen
//! while it runs, so logging must never touch stdout/stderr during that
//! time — output goes to a daily-rolling file via `tracing-appender` instead.

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber to write to a rolling log file.
/// Returns the appender's worker guard — it must be held for the lifetime
/// of the process or buffered log lines are dropped on exit.
pub fn init_file_logging(verbose: u8, quiet: bool, log_dir: &str) -> WorkerGuard {
    let level = level_for(verbose, quiet);
    let filter = EnvFilter::from_default_env().add_directive(format!("esdash={level}").parse().unwrap());

    let file_appender = tracing_appender::rolling::daily(log_dir, "esdash.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    guard
}

/// A bare stderr subscriber for early exits (usage errors, `--version`)
/// that happen before the terminal enters the alternate screen.
pub fn init_stderr_logging(verbose: u8, quiet: bool) {
    let level = level_for(verbose, quiet);
    let filter = EnvFilter::from_default_env().add_directive(format!("esdash={level}").parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
