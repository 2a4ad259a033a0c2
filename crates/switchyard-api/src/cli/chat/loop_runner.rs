//! The interactive chat loop.
//!
//! Every turn goes through `ProviderGateway::converse`, so rate limits,
//! caching and conversation bookkeeping behave exactly as they do behind the
//! REST API.

use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use switchyard_types::chat::MessageRole;
use switchyard_types::error::GatewayError;
use switchyard_types::gateway::ProviderSelection;

use super::banner::{print_welcome_banner, short_id};
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use crate::state::AppState;

/// Session id used for CLI routing selections.
const CLI_SESSION: &str = "cli";

/// Messages shown by `/history`.
const HISTORY_LIMIT: usize = 20;

/// Run the chat loop until the user exits.
///
/// Without `--provider` the first active provider is used.
pub async fn run_chat_loop(
    state: &AppState,
    provider_id: Option<&str>,
    model_id: Option<&str>,
) -> Result<()> {
    let gateway = &state.gateway;

    let provider_id = match provider_id {
        Some(id) => id.to_string(),
        None => gateway
            .registry()
            .list_active()
            .into_iter()
            .next()
            .map(|p| p.id)
            .context("no active providers; pass --provider or activate one in the config")?,
    };

    let mut selection = gateway.select_provider(CLI_SESSION, &provider_id, model_id)?;
    let mut conversation_id = start_conversation(state)?;

    let provider_name = gateway
        .registry()
        .get(&selection.provider_id)
        .map(|p| p.name)
        .unwrap_or_else(|| selection.provider_id.clone());
    print_welcome_banner(&provider_name, &selection.model_id, &conversation_id);

    let (mut chat_input, _writer) = ChatInput::new(prompt(&selection))
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) => text,
        };

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Exit => {
                    println!("\n  {}", style("Session ended.").dim());
                    break;
                }
                ChatCommand::Use {
                    provider_id,
                    model_id,
                } => match gateway.select_provider(CLI_SESSION, &provider_id, model_id.as_deref())
                {
                    Ok(next) => {
                        selection = next;
                        chat_input.update_prompt(&prompt(&selection));
                        println!(
                            "\n  {} Now using {} / {}\n",
                            style("⇄").cyan().bold(),
                            style(&selection.provider_id).cyan(),
                            style(&selection.model_id).dim()
                        );
                    }
                    Err(e) => print_error(&e),
                },
                ChatCommand::Providers => print_providers(state, &selection),
                ChatCommand::Stats => print_stats(state, &conversation_id, &selection),
                ChatCommand::History => print_history(state, &conversation_id),
                ChatCommand::Clear => match gateway.conversations().clear(&conversation_id) {
                    Ok(()) => println!("\n  {}\n", style("Conversation cleared.").dim()),
                    Err(e) => print_error(&e),
                },
                ChatCommand::New => {
                    conversation_id = start_conversation(state)?;
                    println!(
                        "\n  {} New conversation {}\n",
                        style("+").green().bold(),
                        style(short_id(&conversation_id)).dim()
                    );
                }
                ChatCommand::Unknown(msg) => {
                    println!(
                        "\n  {} Unknown command: {}. Type /help for available commands.\n",
                        style("?").yellow().bold(),
                        style(msg).dim()
                    );
                }
            }
            continue;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("asking {}...", selection.provider_id));
        spinner.enable_steady_tick(Duration::from_millis(80));

        let reply = gateway
            .converse(
                &conversation_id,
                &selection.provider_id,
                &selection.model_id,
                &text,
                state.transport.clone(),
            )
            .await;
        spinner.finish_and_clear();

        match reply {
            Ok(message) => {
                println!(
                    "\n  {} {}\n",
                    style(format!("{} >", selection.provider_id)).cyan().bold(),
                    message.content
                );
            }
            Err(e) => {
                print_error(&e);
                if e.is_retryable() {
                    println!(
                        "  {}\n",
                        style("Type a message to retry, /use to switch provider.").dim()
                    );
                }
            }
        }
    }

    chat_input.flush();
    Ok(())
}

fn prompt(selection: &ProviderSelection) -> String {
    format!(
        "  {} ",
        style(format!("You [{}] >", selection.provider_id)).green().bold()
    )
}

/// Create a conversation and make it current.
fn start_conversation(state: &AppState) -> Result<String> {
    let store = state.gateway.conversations();
    let conversation = store.create(None)?;
    store.set_current(&conversation.id)?;
    Ok(conversation.id)
}

fn print_error(e: &GatewayError) {
    eprintln!("\n  {} {e}", style("!").red().bold());
    if let GatewayError::RateLimitExceeded { reset_after_ms, .. } = e {
        eprintln!(
            "  {}",
            style(format!(
                "Budget frees up in {:.1}s.",
                *reset_after_ms as f64 / 1_000.0
            ))
            .dim()
        );
    }
}

fn print_providers(state: &AppState, selection: &ProviderSelection) {
    println!();
    for provider in state.gateway.registry().list_active() {
        let marker = if provider.id == selection.provider_id {
            style("*").green().bold()
        } else {
            style(" ")
        };
        let models = provider
            .models
            .iter()
            .map(|m| m.id.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {} {} {}",
            marker,
            style(&provider.id).cyan(),
            style(models).dim()
        );
    }
    println!();
}

fn print_stats(state: &AppState, conversation_id: &str, selection: &ProviderSelection) {
    let gateway = &state.gateway;
    println!();
    match gateway.conversations().stats(conversation_id) {
        Ok(stats) => println!(
            "  {}  {} messages, ~{} tokens",
            style("Conversation:").bold(),
            stats.message_count,
            stats.approx_token_count
        ),
        Err(e) => print_error(&e),
    }
    match gateway.rate_limit_info(&selection.provider_id) {
        Ok(Some(info)) => println!(
            "  {}  {}/{} remaining, resets {}",
            style("Rate limit:").bold(),
            info.remaining,
            info.limit,
            info.reset_time.format("%H:%M:%S")
        ),
        Ok(None) => println!("  {}  unlimited", style("Rate limit:").bold()),
        Err(e) => print_error(&e),
    }
    let cache = gateway.cache().stats();
    println!(
        "  {}  {}/{} entries, {} hits, {} misses",
        style("Cache:").bold(),
        cache.entries,
        cache.capacity,
        cache.hits,
        cache.misses
    );
    println!();
}

fn print_history(state: &AppState, conversation_id: &str) {
    let messages = match state
        .gateway
        .conversations()
        .recent_messages(conversation_id, HISTORY_LIMIT)
    {
        Ok(messages) => messages,
        Err(e) => {
            print_error(&e);
            return;
        }
    };

    println!();
    if messages.is_empty() {
        println!("  {}", style("No messages yet.").dim());
    }
    for message in messages {
        let label = match message.role {
            MessageRole::User => style("You").green(),
            MessageRole::Assistant => style("AI").cyan(),
            MessageRole::System => style("System").yellow(),
        };
        let preview: String = message.content.chars().take(100).collect();
        println!("  {} {}", label.bold(), preview);
    }
    println!();
}
