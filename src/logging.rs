use std::{
    fs::{self, DirEntry},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result, anyhow};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, RollingFileAppender},
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "polyfill-mapper.log";
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
const STDERR_WARN_FILTER: &str = "warn";
const STDERR_VERBOSE_FILTER: &str = "warn,polyfills=debug";

pub struct LoggingGuard {
    _worker_guard: Option<WorkerGuard>,
}

#[derive(Debug, Default)]
struct RetentionSweep {
    removed: Vec<PathBuf>,
    warnings: Vec<String>,
}

/// Installs the global subscriber: JSON lines into a rolling file under
/// `logging.dir` (when enabled) and human readable output on stderr.
/// `verbose` adds this crate's debug events to stderr.
pub fn init_tracing(logging_config: &LoggingConfig, verbose: bool) -> Result<LoggingGuard> {
    if logging_config.filter.trim().is_empty() {
        return Err(anyhow!("logging.filter cannot be empty"));
    }

    let mut sweep = RetentionSweep::default();
    let mut worker_guard = None;
    let mut log_dir = None;
    let file_layer = if logging_config.file_enabled {
        if logging_config.dir.as_os_str().is_empty() {
            return Err(anyhow!("logging.dir cannot be empty"));
        }
        let dir = resolve_log_dir(&logging_config.dir)?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create logging directory {}", dir.display()))?;

        sweep = sweep_expired_logs(&dir, LOG_FILE_PREFIX, logging_config.retention_days);
        let (writer, guard) = tracing_appender::non_blocking(build_rolling_appender(
            &dir,
            &logging_config.rotation,
        ));
        worker_guard = Some(guard);
        log_dir = Some(dir);

        Some(
            fmt::layer()
                .json()
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(true)
                .with_current_span(true)
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(build_env_filter(&logging_config.filter)?),
        )
    } else {
        None
    };

    let stderr_filter = stderr_filter_directives(logging_config, verbose);
    let stderr_layer = stderr_filter
        .map(build_env_filter)
        .transpose()?
        .map(|filter| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(filter)
        });

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    let run_id = Uuid::now_v7().to_string();
    tracing::info!(
        target: "logging",
        run_id = %run_id,
        dir = ?log_dir,
        filter = %logging_config.filter,
        rotation = ?logging_config.rotation,
        retention_days = logging_config.retention_days,
        stderr_filter = ?stderr_filter,
        "logging_initialized"
    );
    if !sweep.removed.is_empty() {
        tracing::debug!(
            target: "logging",
            removed = sweep.removed.len(),
            "expired_log_files_removed"
        );
    }
    for warning in sweep.warnings {
        tracing::warn!(target: "logging", warning = %warning, "logging_retention_warning");
    }

    Ok(LoggingGuard {
        _worker_guard: worker_guard,
    })
}

/// Directives for the stderr layer; `None` turns stderr output off.
fn stderr_filter_directives(
    logging_config: &LoggingConfig,
    verbose: bool,
) -> Option<&'static str> {
    if verbose {
        Some(STDERR_VERBOSE_FILTER)
    } else {
        logging_config
            .stderr_warn_enabled
            .then_some(STDERR_WARN_FILTER)
    }
}

fn build_env_filter(filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(filter).with_context(|| format!("failed to parse logging.filter '{filter}'"))
}

fn build_rolling_appender(log_dir: &Path, rotation: &LoggingRotation) -> RollingFileAppender {
    match rotation {
        LoggingRotation::Daily => rolling::daily(log_dir, LOG_FILE_PREFIX),
        LoggingRotation::Hourly => rolling::hourly(log_dir, LOG_FILE_PREFIX),
    }
}

fn resolve_log_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }

    Ok(std::env::current_dir()
        .context("failed to read current working directory for logging.dir resolution")?
        .join(dir))
}

fn sweep_expired_logs(log_dir: &Path, prefix: &str, retention_days: usize) -> RetentionSweep {
    sweep_expired_logs_at(log_dir, prefix, retention_days, SystemTime::now())
}

fn sweep_expired_logs_at(
    log_dir: &Path,
    prefix: &str,
    retention_days: usize,
    now: SystemTime,
) -> RetentionSweep {
    let retention = Duration::from_secs((retention_days as u64).saturating_mul(SECONDS_PER_DAY));
    let cutoff = now
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut sweep = RetentionSweep::default();

    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(err) => {
            sweep.warnings.push(format!(
                "failed to scan logging directory {}: {err}",
                log_dir.display()
            ));
            return sweep;
        }
    };

    for entry in entries {
        let expired = entry
            .map_err(|err| format!("failed to iterate logging directory entries: {err}"))
            .and_then(|entry| expired_log_file(&entry, prefix, cutoff));
        match expired {
            Ok(Some(path)) => match fs::remove_file(&path) {
                Ok(()) => sweep.removed.push(path),
                Err(err) => sweep.warnings.push(format!(
                    "failed to remove expired log file {}: {err}",
                    path.display()
                )),
            },
            Ok(None) => {}
            Err(warning) => sweep.warnings.push(warning),
        }
    }

    sweep
}

/// Path of `entry` if it is a prefixed log file last modified at or before
/// `cutoff`.
fn expired_log_file(
    entry: &DirEntry,
    prefix: &str,
    cutoff: SystemTime,
) -> Result<Option<PathBuf>, String> {
    if !entry.file_name().to_string_lossy().starts_with(prefix) {
        return Ok(None);
    }

    let path = entry.path();
    let metadata = entry
        .metadata()
        .map_err(|err| format!("failed to stat {}: {err}", path.display()))?;
    if !metadata.is_file() {
        return Ok(None);
    }

    let modified = metadata
        .modified()
        .map_err(|err| format!("failed to read mtime for {}: {err}", path.display()))?;
    Ok((modified <= cutoff).then_some(path))
}
