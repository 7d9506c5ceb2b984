use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `<prefix>_<UTC timestamp>`, one file per run.
pub fn logfile_path(prefix: &Path, now: DateTime<Utc>) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(format!("_{}", now.format("%Y%m%d_%H%M%S")));
    PathBuf::from(name)
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level`. With `logfile`, events are also written
/// without colors to a timestamped file.
pub fn init_logging(level: &str, logfile: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_lowercase()));

    let file_layer = match logfile {
        Some(prefix) => {
            let path = logfile_path(prefix, Utc::now());
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(())
}
