//! JSONL file writer for audit events.
//!
//! Each [`AuditEvent`] becomes one JSON line carrying `type`, `timestamp`
//! and a per-logger `seq`, merged with the event payload. The file is
//! opened in append mode so restarts extend the existing trail.

use collab_application::{AuditEvent, AuditLogger};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

struct Sink {
    writer: BufWriter<File>,
    seq: u64,
}

/// Audit logger that appends one JSON object per line.
///
/// Thread-safe via a single `Mutex`, which also keeps `seq` in file order.
/// Flushes after every record and on `Drop`.
pub struct JsonlAuditLogger {
    sink: Mutex<Sink>,
    path: PathBuf,
}

impl JsonlAuditLogger {
    /// Open (or create) the audit log at `path`, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            sink: Mutex::new(Sink {
                writer: BufWriter::new(file),
                seq: 0,
            }),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(event: AuditEvent, seq: u64) -> Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let mut map = match event.payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert("type".to_string(), Value::String(event.event_type.to_string()));
        map.insert("timestamp".to_string(), Value::String(timestamp));
        map.insert("seq".to_string(), Value::from(seq));
        Value::Object(map)
    }
}

impl AuditLogger for JsonlAuditLogger {
    fn log(&self, event: AuditEvent) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.seq += 1;
        let record = Self::record(event, sink.seq);

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };
        let writer = &mut sink.writer;
        if let Err(e) = writeln!(writer, "{}", line).and_then(|()| writer.flush()) {
            warn!("Could not write audit log {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for JsonlAuditLogger {
    fn drop(&mut self) {
        let sink = self.sink.get_mut().unwrap_or_else(PoisonError::into_inner);
        let _ = sink.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = JsonlAuditLogger::open(&path).unwrap();

        logger.log(AuditEvent::new(
            "workspace_created",
            json!({ "workspace_id": "ws_1", "owner_id": "u1" }),
        ));
        logger.log(AuditEvent::new(
            "vote_cast",
            json!({ "proposal_id": "rev_1", "voter_id": "u2", "vote": "approve" }),
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "workspace_created");
        assert_eq!(records[0]["owner_id"], "u1");
        assert_eq!(records[0]["seq"], 1);
        assert!(records[0]["timestamp"].is_string());
        assert_eq!(records[1]["type"], "vote_cast");
        assert_eq!(records[1]["seq"], 2);
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = JsonlAuditLogger::open(&path).unwrap();

        logger.log(AuditEvent::new("note", json!("just a string")));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records[0]["type"], "note");
        assert_eq!(records[0]["data"], "just a string");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");

        let first = JsonlAuditLogger::open(&path).unwrap();
        first.log(AuditEvent::new("a", json!({})));
        drop(first);
        let second = JsonlAuditLogger::open(&path).unwrap();
        second.log(AuditEvent::new("b", json!({})));
        drop(second);

        let types: Vec<_> = read_lines(&path)
            .iter()
            .map(|r| r["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(types, vec!["a", "b"]);
    }

    #[test]
    fn test_concurrent_writers_keep_lines_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = Arc::new(JsonlAuditLogger::open(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let logger = Arc::clone(&logger);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        logger.log(AuditEvent::new("edit_recorded", json!({ "t": t, "i": i })));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 200);
        let seqs: Vec<u64> = records.iter().map(|r| r["seq"].as_u64().unwrap()).collect();
        assert_eq!(seqs, (1..=200).collect::<Vec<_>>());
    }
}
