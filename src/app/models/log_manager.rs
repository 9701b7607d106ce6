use std::collections::VecDeque;

const MAX_ENTRIES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// In-window activity log. Every entry is also sent to `tracing`.
#[derive(Default)]
pub struct LogManager {
    pub entries: VecDeque<(LogLevel, String)>,
}

impl LogManager {
    /// Adds an entry prefixed with a `[HH:MM:SS]` UTC timestamp.
    pub fn add_entry(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => tracing::info!("{message}"),
            LogLevel::Error => tracing::warn!("{message}"),
        }

        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let ts = format!("[{:02}:{:02}:{:02}]", (secs % 86400) / 3600, (secs % 3600) / 60, secs % 60);

        if self.entries.len() == MAX_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back((level, format!("{ts} :: {message}")));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.add_entry(LogLevel::Info, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.add_entry(LogLevel::Error, message.into());
    }
}
