pub mod chat;
pub mod doctor;
pub mod engines;

use std::path::Path;

use genaibot_config::Configuration;

/// Load the settings file (optional) with the environment overlaid.
pub(crate) fn load_configuration(path: &Path) -> Result<Configuration, Box<dyn std::error::Error>> {
    Configuration::load(path).map_err(|e| format!("Failed to load configuration: {e}").into())
}
