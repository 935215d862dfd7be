//! Search augmentation descriptor.

use genaibot_config::{Configuration, keys};
use genaibot_core::augmentation::{AugmentationSource, DataSourceAuthentication};
use genaibot_core::error::StartupError;
use reqwest::Url;

/// Build the retrieval source when a search endpoint is configured.
///
/// Presence is decided by comparing the endpoint against the empty string,
/// so a missing key and an empty key both mean "no augmentation".
/// `LLM_INSTRUCTIONS` is passed through verbatim.
pub fn build_augmentation(
    config: &Configuration,
) -> Result<Option<AugmentationSource>, StartupError> {
    let endpoint = config.get_or_default(keys::AZURE_SEARCH_API_ENDPOINT, "");
    if endpoint.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(endpoint)
        .map_err(|e| StartupError::invalid(keys::AZURE_SEARCH_API_ENDPOINT, e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(StartupError::invalid(
            keys::AZURE_SEARCH_API_ENDPOINT,
            "endpoint must be an absolute URL",
        ));
    }

    // An unset index is forwarded as empty.
    let index_name = config.get_or_default(keys::AZURE_SEARCH_INDEX, "");

    Ok(Some(AugmentationSource {
        endpoint: endpoint.to_string(),
        index_name: index_name.to_string(),
        authentication: DataSourceAuthentication::SystemAssignedManagedIdentity,
        role_information: config.get(keys::LLM_INSTRUCTIONS).map(str::to_string),
    }))
}
