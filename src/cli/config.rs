use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "app-pilot",
    version,
    about = "LLM-driven GUI-state abstraction and action resolution for mobile apps"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Ollama API endpoint
    #[arg(long, global = true)]
    pub ollama_endpoint: Option<String>,

    /// Ollama model name
    #[arg(long, global = true)]
    pub ollama_model: Option<String>,

    /// Path to config file (default: app-pilot.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the GUI state from a snapshot file and print its description
    Describe {
        /// Path to a snapshot JSON file
        #[arg(long)]
        snapshot: String,

        /// Screen rendering mode: nl or jsonl
        #[arg(long, default_value = "nl")]
        mode: String,

        /// Character budget for the screen description (0 = unlimited)
        #[arg(long, default_value_t = 6000)]
        limit: usize,

        /// Also print the enumerated possible-action list
        #[arg(long, default_value_t = false)]
        actions: bool,
    },

    /// Run one decision step against a snapshot and print the chosen action
    Step {
        /// Path to a snapshot JSON file
        #[arg(long)]
        snapshot: String,

        /// The task to accomplish
        #[arg(long)]
        task: String,

        /// When the task counts as done
        #[arg(long, default_value = "The task is completed when the goal is achieved.")]
        end_condition: String,

        /// Path to a file holding the chronological task memory
        #[arg(long)]
        memory: Option<String>,

        /// Responder backend: ollama or replay
        #[arg(long, default_value = "ollama")]
        responder: String,

        /// Reply transcript for the replay responder
        #[arg(long)]
        replay: Option<String>,

        /// JSONL file receiving the prompt transcripts
        #[arg(long, default_value = "prompt_records.jsonl")]
        record: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `app-pilot.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppIdentity,
    #[serde(default)]
    pub resolver: ResolverSettings,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppIdentity {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_persona")]
    pub persona: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            persona: default_persona(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverSettings {
    #[serde(default = "default_five")]
    pub max_retries: u32,

    #[serde(default = "default_screen_limit")]
    pub screen_limit: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_retries: 5,
            screen_limit: 6000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OllamaConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

// Serde default helpers
fn default_five() -> u32 {
    5
}
fn default_screen_limit() -> usize {
    6000
}
fn default_app_name() -> String {
    "the app under test".to_string()
}
fn default_persona() -> String {
    "A curious user exploring the application for the first time.".to_string()
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("app-pilot.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}
