//! Concrete event observers
//!
//! - [`LogObserver`] forwards events into `tracing` under the `bank::events` target
//! - [`FileObserver`] appends timestamped events to a log file
//! - [`RecordingObserver`] keeps events in memory for inspection

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::core::Observer;

/// Default tag used by [`LogObserver`]
pub const DEFAULT_LOG_TAG: &str = "DefaultLog";

/// Emits each event as an `info` record tagged with a name
#[derive(Debug, Clone)]
pub struct LogObserver {
    tag: String,
}

impl LogObserver {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_TAG)
    }
}

impl Observer for LogObserver {
    fn on_event(&self, message: &str) {
        info!(target: "bank::events", tag = %self.tag, "{}", message);
    }
}

/// Appends `<message>(<timestamp>)` lines to `<dir>/<name>(<timestamp>).<ext>`
///
/// The file is created when the observer is built. Write failures are logged
/// and dropped so a full disk never stalls a cashier.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileObserver {
    pub fn new(dir: &Path, name: &str, extension: &str) -> Result<Self, String> {
        fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create log directory '{}': {}", dir.display(), e))?;

        let stamp = Local::now().format("%Y_%m_%dT%H_%M_%S%.3f");
        let path = dir.join(format!("{}({}).{}", name, stamp, extension));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| format!("Failed to open log file '{}': {}", path.display(), e))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Observer for FileObserver {
    fn on_event(&self, message: &str) {
        let line = format!("{}({})\n", message, Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"));
        if let Err(e) = self.file.lock().write_all(line.as_bytes()) {
            warn!(path = %self.path.display(), error = %e, "failed to write event to log file");
        }
    }
}

/// Collects every event it sees, in delivery order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    messages: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Observer for RecordingObserver {
    fn on_event(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_recording_observer_keeps_order() {
        let recorder = RecordingObserver::new();

        recorder.on_event("first");
        recorder.on_event("second");

        assert_eq!(recorder.messages(), vec!["first", "second"]);
        assert_eq!(recorder.len(), 2);

        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_log_observer_default_tag() {
        assert_eq!(LogObserver::default().tag(), DEFAULT_LOG_TAG);
        // Emitting without a subscriber installed is a no-op
        LogObserver::new("MyLog").on_event("hello");
    }

    #[test]
    fn test_file_observer_creates_directory_and_appends_lines() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("logs");

        let observer = FileObserver::new(&dir, "MyLogs", "txt").unwrap();
        observer.on_event("deposited 1 USD to account 1");
        observer.on_event("account 9 not found");

        let file_name = observer.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("MyLogs("));
        assert!(file_name.ends_with(").txt"));

        let content = fs::read_to_string(observer.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("deposited 1 USD to account 1("));
        assert!(lines[1].starts_with("account 9 not found("));
        assert!(lines.iter().all(|line| line.ends_with(')')));
    }

    #[test]
    fn test_file_observer_fails_when_directory_is_a_file() {
        let root = TempDir::new().unwrap();
        let blocker = root.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let result = FileObserver::new(&blocker, "MyLogs", "txt");

        assert!(result.unwrap_err().contains("Failed to create log directory"));
    }
}
