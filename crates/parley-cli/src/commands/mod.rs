//! Slash commands for interactive mode

mod history;
mod model;

pub use history::HistoryCommand;
pub use model::ModelCommand;

use parley_session::SessionSnapshot;

/// Result of executing a slash command
pub enum CommandResult {
    /// Start a fresh conversation
    NewConversation,
    /// Load the history entry with this remote id
    LoadConversation(String),
    /// Select a model by slug
    SelectModel(String),
    /// Flip debug mode
    ToggleDebug,
    /// Re-send the last failed message
    Retry,
    /// Fetch models and history again
    Refresh,
    /// Sign the echo backend in
    Login,
    /// Sign the echo backend out
    Logout,
    /// Show a message to the user (not sent to the backend)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, snapshot: &SessionSnapshot) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "new" | "n" => CommandResult::NewConversation,

        "history" | "hist" => CommandResult::Message(HistoryCommand::list_text(snapshot)),

        "load" | "l" => HistoryCommand::execute(args, snapshot),

        "models" => CommandResult::Message(ModelCommand::list_models_text(snapshot)),

        "model" | "m" => ModelCommand::execute(args, snapshot),

        "debug" | "d" => CommandResult::ToggleDebug,

        "retry" | "r" => CommandResult::Retry,

        "refresh" => CommandResult::Refresh,

        "login" => CommandResult::Login,

        "logout" => CommandResult::Logout,

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /new, /n             Start a new conversation
  /history             List stored conversations
  /load, /l <n>        Open conversation number n from /history
  /models              List available models
  /model, /m <name>    Switch to the first model matching name
  /debug, /d           Toggle debug mode (raw reply events)
  /retry, /r           Re-send the last failed message
  /refresh             Fetch models and history again
  /login, /logout      Sign the echo backend in or out
  /quit, /exit, /q     Exit parley"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_api::{HistoryEntry, ModelDescriptor};
    use parley_session::{ConversationStore, SessionState};

    fn snapshot() -> SessionSnapshot {
        let mut store = ConversationStore::new(SessionState::default());
        store.replace_models(vec![
            ModelDescriptor::new("auto", "Auto"),
            ModelDescriptor::new("echo-slow", "Echo (slow)"),
        ]);
        store.replace_history(vec![
            HistoryEntry::new("echo-2", "Second"),
            HistoryEntry::new("echo-1", "First"),
        ]);
        store.snapshot()
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert!(execute_command("hello", &snapshot()).is_none());
    }

    #[test]
    fn test_load_by_index() {
        match execute_command("/load 2", &snapshot()) {
            Some(CommandResult::LoadConversation(id)) => assert_eq!(id, "echo-1"),
            _ => panic!("expected LoadConversation"),
        }
        assert!(matches!(
            execute_command("/load 9", &snapshot()),
            Some(CommandResult::Message(_))
        ));
    }

    #[test]
    fn test_model_by_partial_name() {
        match execute_command("/model slow", &snapshot()) {
            Some(CommandResult::SelectModel(slug)) => assert_eq!(slug, "echo-slow"),
            _ => panic!("expected SelectModel"),
        }
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            execute_command("/frobnicate", &snapshot()),
            Some(CommandResult::Unknown(c)) if c == "frobnicate"
        ));
    }
}
