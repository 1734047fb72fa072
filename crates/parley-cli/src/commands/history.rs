//! /history and /load commands

use super::CommandResult;
use parley_session::SessionSnapshot;

pub struct HistoryCommand;

impl HistoryCommand {
    /// Execute /load: pick a history entry by its 1-based position
    pub fn execute(args: &str, snapshot: &SessionSnapshot) -> CommandResult {
        let Ok(index) = args.parse::<usize>() else {
            return CommandResult::Message(
                "Usage: /load <n>\nUse /history to list conversations".to_string(),
            );
        };

        match index.checked_sub(1).and_then(|i| snapshot.history.get(i)) {
            Some(entry) => CommandResult::LoadConversation(entry.remote_id.clone()),
            None => CommandResult::Message(format!(
                "No conversation number {}\nUse /history to list conversations",
                index
            )),
        }
    }

    /// List history entries as text
    pub fn list_text(snapshot: &SessionSnapshot) -> String {
        if snapshot.history.is_empty() {
            return "No stored conversations".to_string();
        }

        let mut output = String::from("Conversations:\n");
        for (i, entry) in snapshot.history.iter().enumerate() {
            let marker = if snapshot.active.remote_id.as_deref() == Some(entry.remote_id.as_str()) {
                " *"
            } else {
                ""
            };
            let title = if entry.title.is_empty() {
                "(untitled)"
            } else {
                entry.title.as_str()
            };
            output.push_str(&format!(
                "  {}. {} [{}]{}\n",
                i + 1,
                title,
                entry.created_at.format("%Y-%m-%d %H:%M"),
                marker
            ));
        }
        output.push_str("\nOpen with: /load <n>");
        output
    }
}
