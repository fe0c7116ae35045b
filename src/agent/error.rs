use std::fmt;

#[derive(Debug)]
pub enum AgentError {
    /// Snapshot input does not satisfy its structural invariants
    Snapshot(String),

    /// Conversation turn-count invariant violated: caller bug, never retried
    Protocol(String),

    /// Responder transport failed after the collaborator's own retries
    Transport {
        context: String,
        source: reqwest::Error,
    },

    /// Responder endpoint answered with a non-success status
    Api { status: u16, body: String },

    /// Responder payload could not be (de)serialized
    Json {
        context: String,
        source: serde_json::Error,
    },

    /// Replay transcript ran out of replies
    ReplayExhausted,
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Snapshot(msg) => {
                write!(f, "Malformed snapshot: {msg}")
            }
            AgentError::Protocol(msg) => {
                write!(f, "Conversation protocol violation: {msg}")
            }
            AgentError::Transport { context, source } => {
                write!(f, "Responder transport error ({context}): {source}")
            }
            AgentError::Api { status, body } => {
                write!(f, "Responder API error (status {status}): {body}")
            }
            AgentError::Json { context, source } => {
                write!(f, "JSON error ({context}): {source}")
            }
            AgentError::ReplayExhausted => {
                write!(f, "Replay transcript has no more replies")
            }
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AgentError::Transport { source, .. } => Some(source),
            AgentError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}
