use std::path::Path;

use chrono::Local;

use super::append_atomic;
use crate::core::ShengciError;

/// One import session worth of log lines: a timestamp header followed by
/// one bullet per event or failure. Appended to the log file in a single
/// atomic write when the session finishes.
#[derive(Debug, Clone)]
pub struct SessionLog {
    header: String,
    bullets: Vec<String>,
}

impl SessionLog {
    pub fn new(title: &str) -> Self {
        let header =
            format!("=== {} {} ===", title, Local::now().format("%Y-%m-%d %H:%M:%S"));
        Self { header, bullets: Vec::new() }
    }

    pub fn event(&mut self, message: impl Into<String>) {
        self.bullets.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.header);
        out.push('\n');
        for bullet in &self.bullets {
            out.push_str("- ");
            out.push_str(bullet);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    pub fn append_to(&self, path: &Path) -> Result<(), ShengciError> {
        append_atomic(path, &self.render())
    }
}
