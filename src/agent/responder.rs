use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::agent::error::AgentError;
use crate::agent::usage::UsageMeter;

const TRANSPORT_RETRIES: u32 = 3;
const TRANSPORT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// The external language-model collaborator answering templated prompts.
///
/// A call carries the full dialogue so far and returns exactly one new
/// assistant reply. Implementations own transport-level retry; the core
/// never retries a transport failure.
pub trait Responder {
    fn reply(
        &self,
        system_message: &str,
        user_messages: &[String],
        assistant_messages: &[String],
    ) -> Result<String, AgentError>;
}

/// Boundary precondition shared by all responders. A mismatch is a caller
/// bug, surfaced immediately and never retried.
pub fn validate_turns(
    user_messages: &[String],
    assistant_messages: &[String],
) -> Result<(), AgentError> {
    if user_messages.len() != assistant_messages.len() + 1 {
        return Err(AgentError::Protocol(format!(
            "expected one more user message than assistant messages, got {} user / {} assistant",
            user_messages.len(),
            assistant_messages.len()
        )));
    }
    Ok(())
}

// ============================================================================
// Ollama chat backend
// ============================================================================

pub struct OllamaResponder {
    pub endpoint: String,
    pub model: String,
    usage: Mutex<UsageMeter>,
}

impl Default for OllamaResponder {
    fn default() -> Self {
        Self::new("http://localhost:11434/api/chat", "qwen2.5:1.5b")
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

impl OllamaResponder {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            usage: Mutex::new(UsageMeter::new()),
        }
    }

    /// Snapshot of the per-run usage accounting.
    pub fn usage(&self) -> UsageMeter {
        match self.usage.lock() {
            Ok(usage) => usage.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn build_messages(
        &self,
        system_message: &str,
        user_messages: &[String],
        assistant_messages: &[String],
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: system_message.to_string(),
        }];
        for (user, assistant) in user_messages.iter().zip(assistant_messages.iter()) {
            messages.push(ChatMessage {
                role: "user",
                content: user.clone(),
            });
            messages.push(ChatMessage {
                role: "assistant",
                content: assistant.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user_messages[user_messages.len() - 1].clone(),
        });
        messages
    }
}

impl Responder for OllamaResponder {
    fn reply(
        &self,
        system_message: &str,
        user_messages: &[String],
        assistant_messages: &[String],
    ) -> Result<String, AgentError> {
        validate_turns(user_messages, assistant_messages)?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: self.build_messages(system_message, user_messages, assistant_messages),
            stream: false,
        };

        let client = reqwest::blocking::Client::new();
        let start = Instant::now();

        for attempt in 1..=TRANSPORT_RETRIES {
            let response = match client.post(&self.endpoint).json(&request).send() {
                Ok(response) => response,
                Err(source) => {
                    if attempt == TRANSPORT_RETRIES {
                        return Err(AgentError::Transport {
                            context: format!("request failed after {TRANSPORT_RETRIES} attempts"),
                            source,
                        });
                    }
                    eprintln!("Warning: responder request failed (attempt {attempt}): {source}");
                    thread::sleep(TRANSPORT_RETRY_DELAY);
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                return Err(AgentError::Api {
                    status: status.as_u16(),
                    body: response.text().unwrap_or_default(),
                });
            }

            let chat: ChatResponse = response.json().map_err(|source| AgentError::Transport {
                context: "decoding chat response".to_string(),
                source,
            })?;

            if let Ok(mut usage) = self.usage.lock() {
                usage.record(
                    &self.model,
                    chat.prompt_eval_count,
                    chat.eval_count,
                    start.elapsed().as_millis(),
                );
            }

            return Ok(chat.message.content.trim().to_string());
        }

        unreachable!("the transport retry loop always returns")
    }
}

// ============================================================================
// Scripted backend (for tests, no model needed)
// ============================================================================

/// What a scripted responder saw on one call, for assertions on the prompt
/// flow.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_message: String,
    pub user_messages: Vec<String>,
}

/// Returns canned replies in order and records every call it receives.
#[derive(Debug, Default)]
pub struct ScriptedResponder {
    replies: RefCell<VecDeque<String>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedResponder {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: RefCell::new(replies.into_iter().map(Into::into).collect()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl Responder for ScriptedResponder {
    fn reply(
        &self,
        system_message: &str,
        user_messages: &[String],
        assistant_messages: &[String],
    ) -> Result<String, AgentError> {
        validate_turns(user_messages, assistant_messages)?;

        self.calls.borrow_mut().push(RecordedCall {
            system_message: system_message.to_string(),
            user_messages: user_messages.to_vec(),
        });

        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or(AgentError::ReplayExhausted)
    }
}

// ============================================================================
// Replay backend (replies from a file, for deterministic CLI runs)
// ============================================================================

/// Reads replies from a transcript file, one per `---`-separated block.
pub struct ReplayResponder {
    replies: RefCell<VecDeque<String>>,
}

impl ReplayResponder {
    pub fn from_file(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_transcript(&content))
    }

    pub fn from_transcript(content: &str) -> Self {
        let replies = content
            .split("\n---\n")
            .map(|block| block.trim().to_string())
            .filter(|block| !block.is_empty())
            .collect();
        Self {
            replies: RefCell::new(replies),
        }
    }
}

impl Responder for ReplayResponder {
    fn reply(
        &self,
        _system_message: &str,
        user_messages: &[String],
        assistant_messages: &[String],
    ) -> Result<String, AgentError> {
        validate_turns(user_messages, assistant_messages)?;
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or(AgentError::ReplayExhausted)
    }
}
