//! Append-only JSON-lines event log.
//!
//! Purely a side channel: nothing reads it back, and a failing write never
//! reaches the control loop.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, warn};
use turncue_models::{CueEvent, TurnState};

use crate::error::EngineResult;
use crate::metrics;

/// One log line.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum LogRecord<'a> {
    Cue {
        ts: String,
        cue: &'a CueEvent,
    },
    Transition {
        ts: String,
        from: TurnState,
        to: TurnState,
        at_sec: f64,
    },
}

/// Optional JSON-lines event log.
pub struct EventLog {
    writer: Option<BufWriter<File>>,
    warned: bool,
}

impl EventLog {
    /// Open (or create) a log file for appending.
    pub fn open(path: &Path) -> EngineResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!(path = %path.display(), "Event log opened");
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            warned: false,
        })
    }

    /// Open the log, or fall back to a disabled log if the path is unusable.
    pub fn open_or_disabled(path: &Path) -> Self {
        match Self::open(path) {
            Ok(log) => log,
            Err(e) => {
                metrics::record_event_log_failure();
                warn!(path = %path.display(), error = %e, "Event log unavailable, continuing without it");
                Self::disabled()
            }
        }
    }

    /// A log that drops everything.
    pub fn disabled() -> Self {
        Self {
            writer: None,
            warned: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn record_cue(&mut self, cue: &CueEvent) {
        self.write(&LogRecord::Cue { ts: now(), cue });
    }

    pub fn record_transition(&mut self, from: TurnState, to: TurnState, at_sec: f64) {
        self.write(&LogRecord::Transition {
            ts: now(),
            from,
            to,
            at_sec,
        });
    }

    fn write(&mut self, record: &LogRecord<'_>) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        let result = serde_json::to_writer(&mut *writer, record)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush());

        if let Err(e) = result {
            metrics::record_event_log_failure();
            if !self.warned {
                self.warned = true;
                warn!(error = %e, "Event log write failed; further failures are silent");
            }
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use turncue_models::CueKind;

    #[test]
    fn test_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("events.jsonl");

        let mut log = EventLog::open(&path).unwrap();
        log.record_transition(TurnState::Idle, TurnState::AddressedHold, 1.2);
        log.record_cue(&CueEvent::new(CueKind::Hold, "addressed_while_speech", 0.1, 1.2));
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "transition");
        assert_eq!(lines[0]["to"], "addressed_hold");
        assert_eq!(lines[1]["kind"], "cue");
        assert_eq!(lines[1]["cue"]["kind"], "hold");
        assert!(chrono::DateTime::parse_from_rfc3339(lines[1]["ts"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        for _ in 0..2 {
            let mut log = EventLog::open(&path).unwrap();
            log.record_transition(TurnState::Cooldown, TurnState::Idle, 3.0);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_disabled_log_is_noop() {
        let mut log = EventLog::disabled();
        assert!(!log.is_enabled());
        log.record_cue(&CueEvent::new(CueKind::Speak, "gap_after_hold", 0.0, 0.0));
    }

    #[test]
    fn test_unusable_path_falls_back_to_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let mut log = EventLog::open_or_disabled(&blocker.join("events.jsonl"));
        assert!(!log.is_enabled());
        log.record_cue(&CueEvent::new(CueKind::Speak, "addressed_gap_ready", 0.0, 1.0));
    }
}
