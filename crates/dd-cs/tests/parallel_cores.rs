use std::io;
use std::sync::{Arc, Mutex};

use dd_core::DdError;
use dd_cs::parallel::{available_cores, resolve_cores, resolve_cores_with};

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` under a WARN-level subscriber and returns what it logged.
fn logged<T>(f: impl FnOnce() -> T) -> (T, String) {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8_lossy(&log.0.lock().unwrap()).into_owned();
    (value, text)
}

#[test]
fn requests_within_capacity_pass_through() {
    let (resolved, log) = logged(|| resolve_cores_with(2, 8));
    assert_eq!(resolved.unwrap(), 2);
    assert!(log.is_empty(), "unexpected log: {log}");
    assert_eq!(resolve_cores_with(8, 8).unwrap(), 8);
}

#[test]
fn requests_above_capacity_are_capped_with_a_warning() {
    let (resolved, log) = logged(|| resolve_cores_with(64, 4));
    assert_eq!(resolved.unwrap(), 4);
    assert!(log.contains("WARN"), "log: {log}");
    assert!(log.contains("requested=64"), "log: {log}");
    assert!(log.contains("available=4"), "log: {log}");

    assert_eq!(resolve_cores(usize::MAX).unwrap(), available_cores());
}

#[test]
fn zero_workers_is_rejected() {
    let err = resolve_cores_with(0, 4).unwrap_err();
    assert!(matches!(err, DdError::InvalidConfig(_)));
}
