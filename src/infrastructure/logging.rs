use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait EventSink: Send + Sync {
    fn info(&self, component: &str, message: &str);
    fn error(&self, component: &str, message: &str);
}

// Append-only JSON lines; a failed write is dropped rather than surfaced, the
// log is diagnostics only.
#[derive(Debug)]
pub struct JsonLineLogger {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonLineLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            guard: Mutex::new(()),
        }
    }

    fn append(&self, level: &str, component: &str, message: &str) {
        let Ok(_guard) = self.guard.lock() else {
            return;
        };
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "component": component,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(file, "{payload}");
        }
    }
}

impl EventSink for JsonLineLogger {
    fn info(&self, component: &str, message: &str) {
        self.append("info", component, message);
    }

    fn error(&self, component: &str, message: &str) {
        self.append("error", component, message);
    }
}

#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn info(&self, _component: &str, _message: &str) {}

    fn error(&self, _component: &str, _message: &str) {}
}
