//! Unit tests for the logging system.
//!
//! Tests that swap the global logger are serialized with `serial_test`
//! because the logger is process-wide state.

use crate::log::{log, log_detailed, set_logger, LogEntry, LogSeverity, Logger};
use serial_test::serial;
use std::sync::{Arc, Mutex};

/// Test logger that captures entries instead of printing them
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn install_capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(Box::new(CaptureLogger {
        entries: entries.clone(),
    }));
    entries
}

#[test]
fn test_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
#[serial]
fn test_log_reaches_installed_logger() {
    let entries = install_capture();

    log(LogSeverity::Info, "helios::test", "hello".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].source, "helios::test");
    assert_eq!(captured[0].message, "hello");
    assert!(captured[0].file.is_none());
    assert!(captured[0].line.is_none());
}

#[test]
#[serial]
fn test_log_detailed_carries_file_and_line() {
    let entries = install_capture();

    log_detailed(
        LogSeverity::Error,
        "helios::test",
        "boom".to_string(),
        "some_file.rs",
        42,
    );

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].file, Some("some_file.rs"));
    assert_eq!(captured[0].line, Some(42));
}

#[test]
#[serial]
fn test_render_error_macro_records_location() {
    let entries = install_capture();

    crate::render_error!("helios::test", "failure {}", 7);

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Error);
    assert_eq!(captured[0].message, "failure 7");
    assert!(captured[0].file.is_some());
    assert!(captured[0].line.is_some());
}

#[test]
#[serial]
fn test_macros_format_arguments() {
    let entries = install_capture();

    crate::render_trace!("helios::test", "t {}", 1);
    crate::render_debug!("helios::test", "d {}", 2);
    crate::render_info!("helios::test", "i {}", 3);
    crate::render_warn!("helios::test", "w {}", 4);

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 4);
    assert_eq!(captured[0].message, "t 1");
    assert_eq!(captured[1].message, "d 2");
    assert_eq!(captured[2].message, "i 3");
    assert_eq!(captured[3].message, "w 4");
}
