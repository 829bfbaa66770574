//! Append-only event log (`substrate.log`) and sync notifications.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::NotificationsConfig;
use crate::error::Result;

pub const EVENT_LOG_FILE: &str = "substrate.log";

/// One JSON line of the event log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub timestamp: String,
    pub event: String,
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
    identity: String,
}

impl EventLog {
    #[must_use]
    pub fn new(state_dir: &Path, identity: &str) -> Self {
        Self {
            path: state_dir.join(EVENT_LOG_FILE),
            identity: identity.to_string(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event line, creating the log on first use.
    pub fn append(&self, event: &str, details: Option<Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let record = Event {
            timestamp: Utc::now().to_rfc3339(),
            event: event.to_string(),
            identity: self.identity.clone(),
            details,
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// The last `limit` parseable events, oldest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Event>> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut events = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            // Skip lines a crashed writer may have truncated.
            if let Ok(event) = serde_json::from_str::<Event>(&line) {
                events.push(event);
            }
        }
        let skip = events.len().saturating_sub(limit);
        Ok(events.split_off(skip))
    }
}

/// Emit a sync summary through the configured notification method.
pub fn notify(config: &NotificationsConfig, summary: &str) {
    if !config.enabled {
        return;
    }
    match config.method.as_str() {
        "log" => info!(target: "zo_substrate::notify", "{summary}"),
        other => warn!(method = other, "unsupported notification method"),
    }
}
