use std::any::Any;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

/// `crash.log` in the directory that holds `audit_log`.
pub fn crash_log_path(audit_log: impl AsRef<Path>) -> PathBuf {
    match audit_log.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join("crash.log"),
        _ => PathBuf::from("crash.log"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

fn crash_line(thread: &str, message: &str, location: &str) -> String {
    format!("{} CRASH in thread '{}': {} {}\n", chrono::Utc::now().to_rfc3339(), thread, message, location)
}

/// Reports panics on stderr, through tracing and appended to `crash_log`.
///
/// A panic inside a spawned simulation task does not bring the node down,
/// so every one is kept rather than only the last.
pub fn install_panic_hook(crash_log: PathBuf) {
    std::panic::set_hook(Box::new(move |info| {
        let message = panic_message(info.payload());
        let location = match info.location() {
            Some(l) => format!("at {}:{}:{}", l.file(), l.line(), l.column()),
            None => "at unknown location".to_string(),
        };
        let thread = std::thread::current();
        let line = crash_line(thread.name().unwrap_or("unnamed"), message, &location);

        eprint!("{}", line);
        error!("💥 panic: {} {}", message, location);
        if let Some(dir) = crash_log.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&crash_log) {
            let _ = file.write_all(line.as_bytes());
        }
    }));
}

/// Events from the governance and payment crates land in the audit file.
fn is_audit_target(target: &str) -> bool {
    target.starts_with("agentdao_governance") || target.starts_with("agentdao_ledger")
}

/// Installs the stdout and audit file layers.
///
/// The returned guard flushes the audit file on drop; keep it alive for the
/// lifetime of the process.
pub fn init_logging(audit_log: impl AsRef<Path>) -> std::io::Result<WorkerGuard> {
    let audit_log = audit_log.as_ref();
    let dir = match audit_log.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let file_name = audit_log
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "audit.log".into());

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let audit_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            is_audit_target(metadata.target())
        }));

    let stdout_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,agentdao=debug".into()),
    );

    tracing_subscriber::registry()
        .with(audit_layer)
        .with(stdout_layer)
        .init();

    Ok(guard)
}
