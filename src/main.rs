use app_pilot::cli::commands::{cmd_describe, cmd_step};
use app_pilot::cli::config::{Cli, Commands, load_config};
use clap::Parser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    // Resolve Ollama settings: CLI > config > defaults
    let ollama_endpoint = cli
        .ollama_endpoint
        .as_deref()
        .or(config.ollama.endpoint.as_deref());
    let ollama_model = cli
        .ollama_model
        .as_deref()
        .or(config.ollama.model.as_deref());

    match &cli.command {
        Commands::Describe {
            snapshot,
            mode,
            limit,
            actions,
        } => {
            cmd_describe(snapshot, mode, *limit, *actions, cli.verbose)?;
        }
        Commands::Step {
            snapshot,
            task,
            end_condition,
            memory,
            responder,
            replay,
            record,
        } => {
            cmd_step(
                snapshot,
                task,
                end_condition,
                memory.as_deref(),
                responder,
                replay.as_deref(),
                record,
                &config,
                cli.verbose,
                ollama_endpoint,
                ollama_model,
            )?;
        }
    }

    Ok(())
}
