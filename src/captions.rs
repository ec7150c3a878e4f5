use serde::{Deserialize, Serialize};

/// One timed caption line as supplied by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    pub start: f64,
    #[serde(default)]
    pub duration: f64,
    pub text: String,
}

impl CaptionEntry {
    pub fn new(start: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration: 0.0,
            text: text.into(),
        }
    }

    /// `[m:ss]` label for the entry start.
    pub fn timestamp(&self) -> String {
        let start = if self.start.is_finite() && self.start > 0.0 {
            self.start
        } else {
            0.0
        };
        let minutes = (start / 60.0).floor() as u64;
        let seconds = (start % 60.0).floor() as u64;
        format!("[{}:{:02}]", minutes, seconds)
    }
}

/// Join caption entries into `[m:ss] text` lines, keeping provider order.
pub fn format_captions(entries: &[CaptionEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{} {}", entry.timestamp(), entry.text))
        .collect::<Vec<_>>()
        .join("\n")
}
