//! `genaibot chat` — Single-message or interactive chat with the engine.

use std::io::Write;
use std::path::Path;

use genaibot_core::message::Activity;
use genaibot_host::compose;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::load_configuration;

const CHANNEL_ID: &str = "cli";
const USER_ID: &str = "local-user";

pub async fn run(
    config_path: &Path,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_configuration(config_path)?;
    let registry = compose(config)?;
    let engine = registry.engine()?;
    let conversation_id = uuid::Uuid::new_v4().to_string();
    debug!(engine = %engine.kind(), conversation_id = %conversation_id, "Chat session started");

    let activity =
        |text: &str| Activity::message(CHANNEL_ID, &conversation_id, USER_ID, text);

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let reply = engine.on_message(&activity(&msg)).await;
        eprint!("\r              \r");
        println!("{}", reply?);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  GenAIBot — Interactive Mode");
    println!();
    println!("  Engine:    {}", engine.kind());
    println!("  Storage:   {}", registry.storage()?.name());
    println!(
        "  Grounding: {}",
        registry
            .augmentation()
            .map(|a| a.index_name.clone())
            .unwrap_or_else(|| "none".into())
    );
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text == "exit" || text == "quit" {
            break;
        }
        if !text.is_empty() {
            eprint!("  ...");
            match engine.on_message(&activity(text)).await {
                Ok(reply) => {
                    eprint!("\r     \r");
                    println!();
                    for line in reply.lines() {
                        println!("  Bot > {line}");
                    }
                    println!();
                }
                Err(e) => {
                    eprint!("\r     \r");
                    eprintln!("  [Error] {e}");
                    println!();
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}
