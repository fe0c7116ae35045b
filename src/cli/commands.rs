use crate::agent::resolver::{ActionResolver, ProposalRequest, ResolverConfig};
use crate::agent::responder::{OllamaResponder, ReplayResponder, Responder};
use crate::cli::config::AppConfig;
use crate::device::activity::ActivityNameMap;
use crate::load_snapshot;
use crate::state::gui_state::{DescribeMode, GuiState};
use crate::trace::recorder::PromptRecorder;

// ============================================================================
// describe subcommand
// ============================================================================

pub fn cmd_describe(
    snapshot_path: &str,
    mode: &str,
    limit: usize,
    show_actions: bool,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = load_snapshot(snapshot_path)?;

    let mut activity_names = ActivityNameMap::new();
    let state = GuiState::from_snapshot(&snapshot, &mut activity_names)?;

    if verbose > 0 {
        eprintln!(
            "Snapshot {}: {} interactable / {} annotation widgets, {} possible actions",
            state.tag,
            state.interactable_widgets.len(),
            state.non_interactable_widgets.len(),
            state.possible_actions.len()
        );
    }

    let mode = parse_mode(mode)?;
    let length_limit = if limit == 0 { None } else { Some(limit) };
    println!("{}", state.describe_screen(mode, length_limit, true));

    if show_actions {
        println!("\nPossible actions:");
        println!("{}", state.describe_possible_actions(false));
    }

    Ok(())
}

fn parse_mode(mode: &str) -> Result<DescribeMode, Box<dyn std::error::Error>> {
    match mode {
        "nl" => Ok(DescribeMode::NaturalLanguage),
        "jsonl" => Ok(DescribeMode::Jsonl),
        other => Err(format!("unknown description mode: {other} (use nl or jsonl)").into()),
    }
}

// ============================================================================
// step subcommand
// ============================================================================

pub fn cmd_step(
    snapshot_path: &str,
    task: &str,
    end_condition: &str,
    memory_path: Option<&str>,
    responder_name: &str,
    replay_path: Option<&str>,
    record_path: &str,
    config: &AppConfig,
    verbose: u8,
    ollama_endpoint: Option<&str>,
    ollama_model: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = load_snapshot(snapshot_path)?;

    let mut activity_names = ActivityNameMap::new();
    let state = GuiState::from_snapshot(&snapshot, &mut activity_names)?;

    let task_memory = match memory_path {
        Some(path) => std::fs::read_to_string(path)?,
        None => "None".to_string(),
    };

    let screen_description = state.describe_screen(
        DescribeMode::NaturalLanguage,
        Some(config.resolver.screen_limit),
        true,
    );

    let responder = build_responder(responder_name, replay_path, ollama_endpoint, ollama_model)?;

    let mut resolver_config = ResolverConfig::new(&config.app.name, &config.app.persona);
    resolver_config.max_retries = config.resolver.max_retries;
    let resolver = ActionResolver::new(responder.as_ref(), resolver_config);

    let request = ProposalRequest {
        task,
        task_end_condition: end_condition,
        task_memory: task_memory.trim(),
        screen_description: &screen_description,
    };

    if verbose > 0 {
        eprintln!(
            "Resolving next action on '{}' ({} candidates)...",
            state.activity,
            state.possible_actions.len()
        );
    }

    let recorder = PromptRecorder::new(record_path);
    let action = resolver.decide_action(&state, &request, &recorder)?;

    match action {
        Some(action) => println!("{}", serde_json::to_string_pretty(&action)?),
        None => println!("null"),
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Build the appropriate responder backend based on name.
fn build_responder(
    name: &str,
    replay_path: Option<&str>,
    ollama_endpoint: Option<&str>,
    ollama_model: Option<&str>,
) -> Result<Box<dyn Responder>, Box<dyn std::error::Error>> {
    match name {
        "replay" => {
            let path = replay_path.ok_or("--replay <file> is required with --responder replay")?;
            Ok(Box::new(ReplayResponder::from_file(path)?))
        }
        "ollama" => {
            let endpoint = ollama_endpoint.unwrap_or("http://localhost:11434/api/chat");
            let model = ollama_model.unwrap_or("qwen2.5:1.5b");
            Ok(Box::new(OllamaResponder::new(endpoint, model)))
        }
        other => Err(format!("unknown responder backend: {other} (use ollama or replay)").into()),
    }
}
