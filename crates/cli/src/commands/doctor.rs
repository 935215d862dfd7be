//! `genaibot doctor` — Compose the service graph and report what was built.

use std::path::Path;

use genaibot_config::keys;
use genaibot_host::{Capability, compose, engine_settings};

use super::load_configuration;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 GenAIBot Doctor — Startup Diagnostics");
    println!("========================================\n");

    if config_path.exists() {
        println!("  ✅ Settings file: {}", config_path.display());
    } else {
        println!(
            "  ⚠️  No settings file at {} — using environment only",
            config_path.display()
        );
    }

    let config = load_configuration(config_path)?;
    println!("  ✅ Configuration loaded ({} keys)", config.len());

    let selector = config
        .get(keys::GEN_AI_IMPLEMENTATION)
        .unwrap_or("<unset>")
        .to_string();

    let registry = match compose(config) {
        Ok(registry) => registry,
        Err(e) => {
            println!("  ❌ Startup failed: {e}");
            println!();
            return Err(e.into());
        }
    };

    let openai = registry.openai_client()?;
    println!(
        "  ✅ Azure OpenAI:  {} (api-version {})",
        openai.endpoint(),
        openai.api_version()
    );

    match registry.phi_client() {
        Some(phi) => println!("  ✅ Phi:           {}", phi.endpoint()),
        None => println!("  ➖ Phi:           not configured"),
    }

    println!("  ✅ Storage:       {}", registry.storage()?.name());

    match registry.augmentation() {
        Some(source) => println!(
            "  ✅ Augmentation:  {} (index {})",
            source.endpoint, source.index_name
        ),
        None => println!("  ➖ Augmentation:  not configured"),
    }

    let kind = registry.engine()?.kind();
    println!("  ✅ Engine:        {kind} (selector '{selector}')");
    let configuration = registry.configuration()?;
    for key in engine_settings(kind) {
        if configuration.get_non_empty(key).is_none() {
            println!("  ⚠️  {key} is unset; the first turn will fail");
        }
    }

    let missing_optional: Vec<&str> = Capability::ALL
        .into_iter()
        .filter(|c| c.is_optional() && registry.try_resolve(*c).is_none())
        .map(|c| c.as_str())
        .collect();

    println!();
    println!(
        "  🎉 Startup composed {} services.",
        registry.capabilities().count()
    );
    if !missing_optional.is_empty() {
        println!("     Optional, not built: {}", missing_optional.join(", "));
    }

    Ok(())
}
