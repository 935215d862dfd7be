//! Engine selector values.
//!
//! [`EngineKind`] is the closed set of conversational engines a process can
//! run. Parsing a selector string is kept apart from constructing the engine
//! so an unusable selector is rejected before anything is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StartupError;

/// Selector values that were supported once and are now refused outright.
pub const WITHDRAWN_SELECTORS: &[&str] = &["langchain"];

/// The conversational engine variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    ChatCompletions,
    Assistant,
    SemanticKernel,
    Phi,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::ChatCompletions,
        EngineKind::Assistant,
        EngineKind::SemanticKernel,
        EngineKind::Phi,
    ];

    /// The exact selector string that picks this engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::ChatCompletions => "chat-completions",
            EngineKind::Assistant => "assistant",
            EngineKind::SemanticKernel => "semantic-kernel",
            EngineKind::Phi => "phi",
        }
    }

    /// Parse an optional selector. Absent selectors are invalid.
    pub fn parse_selector(value: Option<&str>) -> Result<Self, StartupError> {
        value.unwrap_or_default().parse()
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = StartupError;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(kind) = Self::ALL.into_iter().find(|k| k.as_str() == s) {
            return Ok(kind);
        }
        if WITHDRAWN_SELECTORS.contains(&s) {
            return Err(StartupError::UnsupportedSelection { value: s.to_string() });
        }
        Err(StartupError::InvalidSelection { value: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_selector_maps_to_its_own_kind() {
        assert_eq!("chat-completions".parse::<EngineKind>(), Ok(EngineKind::ChatCompletions));
        assert_eq!("assistant".parse::<EngineKind>(), Ok(EngineKind::Assistant));
        assert_eq!("semantic-kernel".parse::<EngineKind>(), Ok(EngineKind::SemanticKernel));
        assert_eq!("phi".parse::<EngineKind>(), Ok(EngineKind::Phi));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for kind in EngineKind::ALL {
            assert_eq!(kind.to_string().parse::<EngineKind>(), Ok(kind));
        }
    }

    #[test]
    fn langchain_is_unsupported() {
        assert_eq!(
            "langchain".parse::<EngineKind>(),
            Err(StartupError::UnsupportedSelection { value: "langchain".into() })
        );
    }

    #[test]
    fn unknown_and_empty_selectors_are_invalid() {
        for value in ["", "openai", "Chat-Completions", "phi ", "LangChain"] {
            assert!(
                matches!(value.parse::<EngineKind>(), Err(StartupError::InvalidSelection { .. })),
                "{value:?} should be invalid"
            );
        }
        assert!(matches!(
            EngineKind::parse_selector(None),
            Err(StartupError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn serde_uses_selector_strings() {
        let json = serde_json::to_string(&EngineKind::SemanticKernel).unwrap();
        assert_eq!(json, "\"semantic-kernel\"");
    }
}
