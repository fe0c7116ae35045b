use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::agent::conversation::Conversation;

#[derive(Serialize)]
struct PromptRecord<'a> {
    timestamp_ms: u128,
    label: &'a str,
    #[serde(flatten)]
    conversation: &'a Conversation,
}

/// Appends labelled conversation transcripts to a JSONL file, one record per
/// resolved conversation. Recording failures warn and continue; they never
/// affect resolution.
pub struct PromptRecorder {
    file: Option<Mutex<std::fs::File>>,
}

impl PromptRecorder {
    pub fn new(path: &str) -> Self {
        let file = OpenOptions::new().create(true).append(true).open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
            },
            Err(e) => {
                eprintln!("Warning: could not open prompt record file '{}': {}", path, e);
                Self { file: None }
            }
        }
    }

    /// A recorder that drops everything.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn record(&self, conversation: &Conversation, label: &str) {
        let file_mutex = match &self.file {
            Some(f) => f,
            None => return, // recording disabled
        };

        let record = PromptRecord {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis())
                .unwrap_or(0),
            label,
            conversation,
        };

        let json = match serde_json::to_string(&record) {
            Ok(j) => j,
            Err(e) => {
                eprintln!("Warning: failed to serialize prompt record: {}", e);
                return;
            }
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Warning: prompt recorder lock poisoned: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            eprintln!("Warning: failed to write prompt record: {}", e);
        }
    }
}
