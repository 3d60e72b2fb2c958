use whispercart_agent::IntentExtractor;

use crate::commands::CommandResult;

pub fn run(text: &str) -> CommandResult {
    let text = text.trim();
    if text.is_empty() {
        return CommandResult::failure("intent", "invalid_input", "text must not be empty", 2);
    }

    let record = IntentExtractor::new().extract(text);
    CommandResult::with_data("intent", "intent extracted with local rules", &record)
}
