#![allow(dead_code)]

use mixdown_core::{AudioEngine, EngineEvent, EngineInvocation, EngineJob, MixLogger};
use serde_json::Value;
use std::sync::Mutex;

/// Replays a fixed list of events, optionally writing the output file first
/// so failure cleanup has something to remove.
pub struct ScriptedEngine {
    pub events: Vec<EngineEvent>,
    pub write_output: bool,
    pub seen: Mutex<Vec<EngineInvocation>>,
    /// Contents of both inputs at spawn time.
    pub input_bytes: Mutex<Vec<(Vec<u8>, Vec<u8>)>>,
}

impl ScriptedEngine {
    pub fn new(events: Vec<EngineEvent>, write_output: bool) -> Self {
        Self {
            events,
            write_output,
            seen: Mutex::new(Vec::new()),
            input_bytes: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(
            vec![
                EngineEvent::Started {
                    command_line: "ffmpeg -i vocal -i beat".into(),
                },
                EngineEvent::Progress {
                    position: "00:00:01.500000".into(),
                },
                EngineEvent::Finished,
            ],
            true,
        )
    }

    pub fn failing(message: &str) -> Self {
        Self::new(
            vec![
                EngineEvent::Started {
                    command_line: "ffmpeg -i vocal -i beat".into(),
                },
                EngineEvent::Progress {
                    position: "00:00:00.500000".into(),
                },
                EngineEvent::Failed {
                    message: message.into(),
                },
            ],
            true,
        )
    }

    pub fn spawn_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl AudioEngine for ScriptedEngine {
    fn spawn(&self, invocation: EngineInvocation) -> EngineJob {
        let vocal = std::fs::read(&invocation.inputs[0]).unwrap_or_default();
        let beat = std::fs::read(&invocation.inputs[1]).unwrap_or_default();
        self.input_bytes.lock().unwrap().push((vocal, beat));

        if self.write_output {
            std::fs::write(&invocation.output, b"ID3 partial mp3").unwrap();
        }
        self.seen.lock().unwrap().push(invocation);

        let (tx, job) = EngineJob::channel();
        let events = self.events.clone();
        tokio::spawn(async move {
            for e in events {
                if tx.send(e).await.is_err() {
                    break;
                }
            }
        });
        job
    }
}

#[derive(Default)]
pub struct RecordingLogger {
    pub lines: Mutex<Vec<(String, String)>>,
}

impl RecordingLogger {
    pub fn messages(&self, level: &str) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn push(&self, level: &str, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((level.to_string(), message.to_string()));
    }
}

impl MixLogger for RecordingLogger {
    fn info(&self, message: &str, _fields: &Value) {
        self.push("info", message);
    }

    fn debug(&self, message: &str, _fields: &Value) {
        self.push("debug", message);
    }

    fn error(&self, message: &str, _fields: &Value) {
        self.push("error", message);
    }
}

pub fn files_in(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(rd) => rd.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}
