use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::error::{AppError, Result};

/// Install stdout + file logging. The returned guard flushes the file writer
/// on drop and must be held for the life of the process.
pub fn init(cfg: &Config) -> Result<WorkerGuard> {
    let (dir, file_name) = split_log_path(&cfg.log_file)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| AppError::Config(format!("cannot open log file {}: {e}", cfg.log_file.display())))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(EnvFilter::new(&cfg.log_level))
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}

fn split_log_path(path: &Path) -> Result<(&Path, String)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::Config(format!("LOG_FILE has no file name: {}", path.display())))?
        .to_string();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Ok((dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_name_logs_to_cwd() {
        let (dir, name) = split_log_path(Path::new("price_tracker.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "price_tracker.log");
    }

    #[test]
    fn nested_path_is_split() {
        let (dir, name) = split_log_path(Path::new("/var/log/tracker/out.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log/tracker"));
        assert_eq!(name, "out.log");
    }

    #[test]
    fn directory_only_path_is_rejected() {
        assert!(split_log_path(Path::new("/")).is_err());
    }
}
