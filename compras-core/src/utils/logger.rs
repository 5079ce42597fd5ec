//! Logging Infrastructure
//!
//! `RUST_LOG` wins over the configured level. When `log_dir` exists, output
//! goes to a daily rolling file instead of stderr; stdout is left for command
//! results.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber
pub fn init_logger(log_level: &str, json: bool, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},sqlx=warn")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, "compras");
            let builder = builder.with_ansi(false).with_writer(file_appender);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
            return;
        }
    }

    let builder = builder.with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
