//! Welcome banner for chat sessions.

use console::style;

/// Print the routing target and conversation id at session start.
pub fn print_welcome_banner(provider_name: &str, model_id: &str, conversation_id: &str) {
    println!();
    println!("  {} {}", style("⇄").cyan(), style(provider_name).cyan().bold());
    println!();
    println!("  {}  {}", style("Model:").bold(), style(model_id).dim());
    println!(
        "  {}  {}",
        style("Conversation:").bold(),
        style(short_id(conversation_id)).dim()
    );
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}

/// Trailing eight characters of an id; uuid v7 prefixes are timestamps and
/// look alike within a session.
pub fn short_id(id: &str) -> &str {
    let len = id.chars().count();
    if len <= 8 {
        return id;
    }
    let start = id
        .char_indices()
        .nth(len - 8)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &id[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("0192f3a1-7c4e-7b2a-9d11-5e6f7a8b9c0d"), "7a8b9c0d");
    }
}
