use chrono::NaiveDate;
use serde::Serialize;
use soundrent_agent::intent::{classify, IntentCategory};
use soundrent_agent::slots::{detect, SlotMentions};

use crate::commands::{CommandResult, EXIT_INPUT};

#[derive(Debug, Serialize)]
struct Classification {
    intent: Option<&'static str>,
    category: Option<IntentCategory>,
    slots: SlotMentions,
}

pub fn run(message: &str, reference: NaiveDate) -> CommandResult {
    if message.trim().is_empty() {
        return CommandResult::failure("classify", "invalid_input", "message is empty", EXIT_INPUT);
    }

    let intent = classify(message);
    CommandResult::report(
        "classify",
        Classification {
            intent: intent.map(|intent| intent.tag()),
            category: intent.map(|intent| intent.category()),
            slots: detect(message, reference),
        },
    )
}
