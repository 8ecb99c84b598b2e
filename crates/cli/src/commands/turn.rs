use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use soundrent_agent::{client_from_config, AgentRuntime, InMemoryCatalog, TurnReply, TurnRequest};
use soundrent_core::config::AppConfig;
use soundrent_core::Inventory;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_INPUT, EXIT_RUNTIME};

#[derive(Debug, Serialize)]
struct TurnBody {
    reply: TurnReply,
}

/// Replays one chat turn from a JSON transcript file shaped like the widget
/// payload (`messages`, `activeScenarioId`, ...).
pub fn run(config: &AppConfig, transcript_path: &Path) -> CommandResult {
    let raw = match fs::read_to_string(transcript_path) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "turn",
                "invalid_input",
                format!("could not read transcript `{}`: {error}", transcript_path.display()),
                EXIT_INPUT,
            );
        }
    };
    let request: TurnRequest = match serde_json::from_str(&raw) {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure(
                "turn",
                "invalid_input",
                format!("transcript is not a valid turn request: {error}"),
                EXIT_INPUT,
            );
        }
    };

    let llm = match client_from_config(&config.llm) {
        Ok(llm) => llm,
        Err(error) => {
            return CommandResult::failure("turn", "config_validation", format!("{error:#}"), EXIT_CONFIG);
        }
    };
    let catalog = Arc::new(InMemoryCatalog::seeded(&config.catalog.packs, &Inventory::default()));
    let agent = AgentRuntime::from_config(config, llm, catalog);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure("turn", "runtime", error.to_string(), EXIT_RUNTIME);
        }
    };
    let reply = runtime.block_on(agent.handle_turn(&request));

    CommandResult::report("turn", TurnBody { reply })
}
