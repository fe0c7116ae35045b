use crate::action::action_model::{ActionType, PossibleAction, ScrollDirection};
use crate::agent::conversation::Conversation;
use crate::agent::error::AgentError;
use crate::agent::responder::Responder;
use crate::state::gui_state::GuiState;
use crate::trace::recorder::PromptRecorder;

pub const MAX_RETRY: u32 = 5;

const RETRY_FEEDBACK: &str = "Your provided action is not possible on the current screen. \
Generate the valid action again following the provided template.";

const TEMPLATE_BOILERPLATE: &str = "I am going to provide a template for your output to reason \
about your choice step by step. Fill out the <...> parts in the template with your own words. \
Do not include anything else in your answer except the text to fill out the template. Preserve \
the formatting and overall template.";

/// Per-run resolver settings. The retry bound applies to both the matching
/// phase's corrective re-prompts and the outer propose/match loop.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub app_name: String,
    pub persona_profile: String,
    pub max_retries: u32,
}

impl ResolverConfig {
    pub fn new(app_name: &str, persona_profile: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            persona_profile: persona_profile.to_string(),
            max_retries: MAX_RETRY,
        }
    }
}

/// Everything the proposal phase needs to frame one decision step.
#[derive(Debug, Clone)]
pub struct ProposalRequest<'a> {
    pub task: &'a str,
    pub task_end_condition: &'a str,
    pub task_memory: &'a str,
    pub screen_description: &'a str,
}

/// Two-phase action resolution against an external responder: propose a next
/// action in natural language, then match it to a concrete action index,
/// feeding failures back into the proposal under a bounded retry loop.
pub struct ActionResolver<'a> {
    responder: &'a dyn Responder,
    pub config: ResolverConfig,
}

impl<'a> ActionResolver<'a> {
    pub fn new(responder: &'a dyn Responder, config: ResolverConfig) -> Self {
        Self { responder, config }
    }

    // ------------------------------------------------------------------
    // Phase A: propose
    // ------------------------------------------------------------------

    /// Ask the responder for the next action in natural language.
    ///
    /// On a fresh invocation the persona/task context is derived from the
    /// request; on a retry (`previous` supplied) the prior transcript is
    /// continued with a single corrective message. Returns `None` when the
    /// responder ends the task ("none" or an affirmative end-task field).
    pub fn propose_next_action(
        &self,
        request: &ProposalRequest<'_>,
        previous: Option<&Conversation>,
    ) -> Result<(Option<String>, Conversation), AgentError> {
        let (system_message, user_messages, mut assistant_messages) = match previous {
            None => (
                self.proposal_system_message(),
                vec![self.proposal_user_message(request)],
                Vec::new(),
            ),
            Some(previous) => {
                let mut user_messages = previous.prompts();
                user_messages.push(RETRY_FEEDBACK.to_string());
                (
                    previous.system_message.clone(),
                    user_messages,
                    previous.replies(),
                )
            }
        };

        let reply = self
            .responder
            .reply(&system_message, &user_messages, &assistant_messages)?;
        assistant_messages.push(reply.clone());
        let conversation = Conversation::zip(&system_message, &user_messages, &assistant_messages);

        let mut end_task = false;
        let mut next_action: Option<String> = None;
        let mut reasoning: Option<String> = None;

        for line in reply.lines() {
            let line = line.trim();
            if let Some(value) = field_value(line, "End the task?:") {
                if value.to_lowercase().contains("yes") {
                    end_task = true;
                    break;
                }
            }
            if let Some(value) = field_value(line, "Reasoning for the next action choice:") {
                reasoning = Some(value.trim().to_string());
            }
            if let Some(value) = field_value(line, "Next action:") {
                next_action = Some(value.trim().to_string());
            }
        }

        if end_task || next_action.as_deref() == Some("none") {
            return Ok((None, conversation));
        }
        let Some(action) = next_action else {
            // No parseable proposal at all: the step is over, not matchable.
            return Ok((None, conversation));
        };

        let action = match reasoning {
            Some(reasoning) => format!("{action} ({reasoning})"),
            None => action,
        };
        Ok((Some(action), conversation))
    }

    fn proposal_system_message(&self) -> String {
        format!(
            "Act as a person using an Android mobile application named {} with the given profile:\n\
{}\n\
\n\
You are going to choose the next GUI action to accomplish the task. You can end the task if it is completed or no longer feasible to accomplish.",
            self.config.app_name, self.config.persona_profile
        )
    }

    fn proposal_user_message(&self, request: &ProposalRequest<'_>) -> String {
        let end_condition = if request.task_end_condition.ends_with('.') {
            request.task_end_condition.to_string()
        } else {
            format!("{}.", request.task_end_condition)
        };

        format!(
            "Your current task is \"{task}\". {end_condition}\n\
Decide a next GUI action to accomplish the task. To end the task, say \"none\".\n\
\n\
Your memory about the task (listed in chronological order):\n\
{memory}\n\
\n\
Current screen description:\n\
{screen}\n\
\n\
{boilerplate}\n\
\n\
=== Below is the template for your answer ===\n\
Current progress for the task: <1~2 sentences according to your memory and the current screen description>\n\
Remaining actions to finish the task: <1~2 sentences according to your memory, current screen description, and the task end condition>\n\
End the task?: <yes/no, do not include anything else in your answer>\n\
Next action: <1 sentence, start with \"I will\", or just say \"none\" to end the task>\n\
Reasoning for the next action choice: <1 short sentence, start with \"Because I need to\", not required if next action is none>",
            task = request.task,
            end_condition = end_condition,
            memory = request.task_memory,
            screen = request.screen_description,
            boilerplate = TEMPLATE_BOILERPLATE,
        )
    }

    // ------------------------------------------------------------------
    // Phase B: match
    // ------------------------------------------------------------------

    /// Match a natural-language action description to one of the snapshot's
    /// concrete action ids. Invalid replies are corrected with an explicit
    /// valid-range message, at most `max_retries` times; exhaustion yields
    /// no id, never an error.
    pub fn match_action_id(
        &self,
        state: &GuiState,
        action_description: &str,
    ) -> Result<(Option<usize>, Conversation), AgentError> {
        let system_message = "You are a helpful assistant who can select the concrete GUI action \
ID from the given action description.";
        let mut user_messages = vec![self.match_user_message(state, action_description)];
        let mut assistant_messages: Vec<String> = Vec::new();

        let num_actions = state.possible_actions.len();

        let mut reply = self
            .responder
            .reply(system_message, &user_messages, &assistant_messages)?;
        assistant_messages.push(reply.clone());
        let mut candidate = parse_action_id(&reply);

        let mut matched = None;
        for attempt in 0..=self.config.max_retries {
            match validate_action_id(candidate.as_deref(), num_actions) {
                Some(ActionIdReply::Matched(id)) => {
                    matched = Some(id);
                    break;
                }
                Some(ActionIdReply::NoMatch) => break,
                None => {}
            }
            if attempt == self.config.max_retries {
                break;
            }

            let retry_question = format!(
                "You did not provide a valid ID. Please provide a valid integer ID (0~{}) or -1 \
(if none of the action IDs are matched with the given description). Generate the answer again \
following the provided template.",
                num_actions as i64 - 1
            );
            user_messages.push(retry_question);

            reply = self
                .responder
                .reply(system_message, &user_messages, &assistant_messages)?;
            assistant_messages.push(reply.clone());
            candidate = parse_action_id(&reply);
        }

        let conversation = Conversation::zip(system_message, &user_messages, &assistant_messages);
        Ok((matched, conversation))
    }

    fn match_user_message(&self, state: &GuiState, action_description: &str) -> String {
        format!(
            "Select the action ID that best matches the given action description.\n\
{action_description}\n\
\n\
Choose one of the following action IDs:\n\
{actions}\n\
\n\
{boilerplate}\n\
\n\
=== Below is the template for your answer ===\n\
Action type: <event type (string), e.g., \"click\", \"scroll\", \"set_text\", \"key_event\">\n\
Target widget: <properties of the target widget (string), e.g., \"the button with the text \"OK\"\", \"the text field with the resource_id \"username_field\"\">\n\
Action ID: <action_id (integer), -1 if no match>",
            action_description = action_description,
            actions = state.describe_possible_actions(false),
            boilerplate = TEMPLATE_BOILERPLATE,
        )
    }

    // ------------------------------------------------------------------
    // Phase C: bind parameters of a chosen action
    // ------------------------------------------------------------------

    /// Ask for the parameter of a parameterized action, continuing the
    /// proposal conversation: a scroll direction (defaulting to DOWN when
    /// the reply is unusable) or the literal text to type.
    pub fn prompt_action_data(
        &self,
        action: &mut PossibleAction,
        previous: &Conversation,
    ) -> Result<Conversation, AgentError> {
        let target = action
            .target
            .as_ref()
            .map(|target| target.summary.clone())
            .unwrap_or_else(|| "the target widget".to_string());

        let question = match action.action_type {
            ActionType::Scroll => format!(
                "Choose the direction to scroll on {target}. Answer with only one word among \
\"UP\", \"DOWN\", \"LEFT\", and \"RIGHT\"."
            ),
            ActionType::SetText => format!(
                "Provide the text to enter into {target}. Answer with only the text to input, \
without any explanation."
            ),
            _ => return Ok(previous.clone()),
        };

        let mut user_messages = previous.prompts();
        user_messages.push(question);
        let mut assistant_messages = previous.replies();

        let reply = self.responder.reply(
            &previous.system_message,
            &user_messages,
            &assistant_messages,
        )?;
        assistant_messages.push(reply.clone());

        match action.action_type {
            ActionType::Scroll => {
                let direction = ScrollDirection::parse(&reply).unwrap_or(ScrollDirection::Down);
                action.bind_direction(direction);
            }
            ActionType::SetText => {
                action.bind_input_text(strip_quotes(&reply).to_string());
            }
            _ => unreachable!("only parameterized actions reach here"),
        }

        Ok(Conversation::zip(
            &previous.system_message,
            &user_messages,
            &assistant_messages,
        ))
    }

    // ------------------------------------------------------------------
    // Outer loop
    // ------------------------------------------------------------------

    /// Run one full decision step: propose, match, and on a failed match
    /// feed "action not possible" back into the proposal, up to the retry
    /// bound. Exhaustion is a normal "no action" outcome, not an error; the
    /// transcripts are handed to the recorder in every terminal path.
    pub fn decide_action(
        &self,
        state: &GuiState,
        request: &ProposalRequest<'_>,
        recorder: &PromptRecorder,
    ) -> Result<Option<PossibleAction>, AgentError> {
        let (proposal, mut proposal_conversation) = self.propose_next_action(request, None)?;
        let mut action_description = match proposal {
            Some(description) => description,
            None => {
                recorder.record(&proposal_conversation, "action_NL");
                return Ok(None);
            }
        };

        let (mut matched, mut match_conversation) =
            self.match_action_id(state, &action_description)?;

        for _ in 0..self.config.max_retries {
            if matched.is_some() {
                break;
            }

            let (proposal, conversation) =
                self.propose_next_action(request, Some(&proposal_conversation))?;
            proposal_conversation = conversation;
            match proposal {
                Some(description) => action_description = description,
                None => {
                    recorder.record(&proposal_conversation, "action_NL");
                    return Ok(None);
                }
            }

            let (id, conversation) = self.match_action_id(state, &action_description)?;
            matched = id;
            match_conversation = conversation;
        }

        recorder.record(&proposal_conversation, "action_NL");
        recorder.record(&match_conversation, "action_id");

        let Some(action_id) = matched else {
            eprintln!(
                "Warning: failed to match an action ID for: {action_description} - aborting the step"
            );
            return Ok(None);
        };

        let mut action = state.possible_actions[action_id].clone();
        if matches!(action.action_type, ActionType::Scroll | ActionType::SetText) {
            let data_conversation = self.prompt_action_data(&mut action, &proposal_conversation)?;
            recorder.record(&data_conversation, "action_data");
        }

        Ok(Some(action))
    }
}

// ----------------------------------------------------------------------
// Reply parsing
// ----------------------------------------------------------------------

/// Case-insensitive line-prefix field lookup; replies are scanned, never
/// parsed against a grammar.
fn field_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(&line[label.len()..])
    } else {
        None
    }
}

/// Extract the action-id text from a matching-phase reply: a bare number is
/// accepted whole, otherwise the `Action ID:` field is scanned for, and an
/// affirmative `End the task?:` anywhere forces `-1`.
fn parse_action_id(reply: &str) -> Option<String> {
    let trimmed = reply.trim();
    if trimmed == "-1" || (!trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())) {
        return Some(trimmed.to_string());
    }

    let mut action_id = None;
    for line in reply.lines() {
        let line = line.trim();
        if let Some(value) = field_value(line, "End the task?:") {
            if value.trim().to_lowercase() == "yes" {
                action_id = Some("-1".to_string());
                break;
            }
        }
        if let Some(value) = field_value(line, "Action ID:") {
            action_id = Some(value.trim().to_string());
        }
    }
    action_id
}

enum ActionIdReply {
    Matched(usize),
    NoMatch,
}

fn validate_action_id(candidate: Option<&str>, num_actions: usize) -> Option<ActionIdReply> {
    let value: i64 = candidate?.trim().parse().ok()?;
    if value == -1 {
        return Some(ActionIdReply::NoMatch);
    }
    if value >= 0 && (value as usize) < num_actions {
        return Some(ActionIdReply::Matched(value as usize));
    }
    None
}

fn strip_quotes(reply: &str) -> &str {
    let trimmed = reply.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(trimmed)
}
