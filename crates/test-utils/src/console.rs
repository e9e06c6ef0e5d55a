use std::sync::Mutex;

use tilerun::progress::ProgressSink;

/// `ProgressSink` that keeps every call for later assertions.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    echoed: Mutex<Vec<String>>,
    updates: Mutex<Vec<String>>,
    summary: Mutex<Option<String>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn echoed(&self) -> Vec<String> {
        self.echoed.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<String> {
        self.updates.lock().unwrap().clone()
    }

    pub fn last_update(&self) -> Option<String> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub fn summary(&self) -> Option<String> {
        self.summary.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingConsole {
    fn echo(&self, line: &str) {
        self.echoed.lock().unwrap().push(line.to_string());
    }

    fn update(&self, rendered: &str) {
        self.updates.lock().unwrap().push(rendered.to_string());
    }

    fn finish(&self, summary: &str) {
        *self.summary.lock().unwrap() = Some(summary.to_string());
    }
}
