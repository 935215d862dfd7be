//! `genaibot engines` — List accepted engine selectors.

use genaibot_config::keys;
use genaibot_core::engine::{EngineKind, WITHDRAWN_SELECTORS};
use genaibot_host::engine_settings;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🤖 Conversational Engines");
    println!("=========================");
    println!();
    println!("  Select one with {}:", keys::GEN_AI_IMPLEMENTATION);
    println!();
    println!("  {:<18} {}", "Selector", "Settings");
    println!("  {:<18} {}", "--------", "--------");
    for kind in EngineKind::ALL {
        println!("  {:<18} {}", kind.as_str(), engine_settings(kind).join(", "));
    }
    println!();
    println!("  All engines also need {}.", keys::AZURE_OPENAI_API_ENDPOINT);
    println!("  Only the phi settings are checked at startup.");
    println!(
        "  No longer supported: {}",
        WITHDRAWN_SELECTORS.join(", ")
    );

    Ok(())
}
