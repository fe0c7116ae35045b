use serde::Serialize;

/// One prompt/reply pair. Only the final turn of a conversation may still be
/// waiting for its reply.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub prompt: String,
    pub reply: Option<String>,
}

/// The accumulating transcript of one resolution attempt: continued under
/// retry, then handed off to the recorder collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub system_message: String,
    pub conversation: Vec<Turn>,
}

impl Conversation {
    /// Zip parallel message lists back into a transcript. When there is one
    /// more prompt than replies, the trailing prompt is kept reply-less.
    pub fn zip(system_message: &str, prompts: &[String], replies: &[String]) -> Conversation {
        let mut turns: Vec<Turn> = prompts
            .iter()
            .zip(replies.iter())
            .map(|(prompt, reply)| Turn {
                prompt: prompt.clone(),
                reply: Some(reply.clone()),
            })
            .collect();
        if prompts.len() == replies.len() + 1 {
            turns.push(Turn {
                prompt: prompts[prompts.len() - 1].clone(),
                reply: None,
            });
        }

        Conversation {
            system_message: system_message.to_string(),
            conversation: turns,
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.conversation
            .iter()
            .map(|turn| turn.prompt.clone())
            .collect()
    }

    pub fn replies(&self) -> Vec<String> {
        self.conversation
            .iter()
            .filter_map(|turn| turn.reply.clone())
            .collect()
    }

    /// Flat rendering for diagnostics and error dumps.
    pub fn render(&self) -> String {
        let mut out = format!("\n*** System:\n{}\n", self.system_message);
        for turn in &self.conversation {
            out.push_str(&format!("\n*** User:\n{}\n", turn.prompt));
            if let Some(reply) = &turn.reply {
                out.push_str(&format!("\n*** Assistant:\n{reply}\n"));
            }
        }
        out
    }
}
