//! /model command - list and switch models

use super::CommandResult;
use parley_session::SessionSnapshot;

pub struct ModelCommand;

impl ModelCommand {
    /// Execute /model command - lists models if no args, or switches to a matching model
    pub fn execute(args: &str, snapshot: &SessionSnapshot) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message(Self::list_models_text(snapshot));
        }

        match parley_api::models::find_model(&snapshot.models, args) {
            Some(model) => CommandResult::SelectModel(model.slug.clone()),
            None => CommandResult::Message(format!(
                "No model found matching '{}'\nUse /models to list available models",
                args
            )),
        }
    }

    /// List models as text
    pub fn list_models_text(snapshot: &SessionSnapshot) -> String {
        if snapshot.models.is_empty() {
            return "No models available".to_string();
        }

        let mut output = String::from("Available models:\n");
        for model in &snapshot.models {
            let marker = if model.slug == snapshot.state.selected_model {
                " *"
            } else {
                ""
            };
            output.push_str(&format!("  {} ({}){}\n", model.slug, model.title, marker));
        }
        output.push_str("\nSwitch with: /model <name>");
        output
    }
}
