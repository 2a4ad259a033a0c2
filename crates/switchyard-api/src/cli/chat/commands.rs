//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and switch providers, inspect budgets and manage
//! the conversation without leaving the prompt.

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    /// Route the session to another provider, optionally pinning a model.
    Use {
        provider_id: String,
        model_id: Option<String>,
    },
    /// List active providers.
    Providers,
    /// Conversation, rate-limit and cache figures.
    Stats,
    History,
    /// Empty the current conversation.
    Clear,
    /// Start a fresh conversation with the same routing.
    New,
    Exit,
    /// Unknown command or bad arguments; carries the message to show.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.split_whitespace();
    let cmd = parts.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = parts.collect();

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/use" | "/provider" => match args.as_slice() {
            [provider] => ChatCommand::Use {
                provider_id: provider.to_string(),
                model_id: None,
            },
            [provider, model] => ChatCommand::Use {
                provider_id: provider.to_string(),
                model_id: Some(model.to_string()),
            },
            _ => ChatCommand::Unknown("/use expects <provider> [model]".to_string()),
        },
        "/providers" => ChatCommand::Providers,
        "/stats" => ChatCommand::Stats,
        "/history" => ChatCommand::History,
        "/clear" => ChatCommand::Clear,
        "/new" => ChatCommand::New,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/use <provider> [model]", "Switch provider and model"),
        ("/providers", "List active providers"),
        ("/stats", "Conversation, rate-limit and cache figures"),
        ("/history", "Show recent messages"),
        ("/clear", "Empty this conversation"),
        ("/new", "Start a new conversation"),
        ("/exit", "End the chat session"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (cmd, text) in rows {
        println!("  {:<26} {}", style(cmd).cyan(), text);
    }
    println!();
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}
