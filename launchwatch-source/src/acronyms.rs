//! Space acronym lookups against the decronym dictionary.

use std::collections::HashMap;

use launchwatch_core::SourceError;
use tracing::{debug, warn};

pub const DECRONYM_URL: &str = "http://decronym.xyz/acronyms/Space.json";

/// Acronym (upper case) to its definitions.
pub type AcronymDictionary = HashMap<String, Vec<String>>;

#[derive(Debug, Clone)]
pub struct AcronymClient {
    url: String,
    client: reqwest::Client,
}

impl Default for AcronymClient {
    fn default() -> Self {
        Self::new(DECRONYM_URL)
    }
}

impl AcronymClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Definitions for `acronym`, empty when unknown or the dictionary is unavailable.
    pub async fn lookup(&self, acronym: &str) -> Result<Vec<String>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, %status, "acronym dictionary unavailable");
            return Ok(Vec::new());
        }

        let dictionary: AcronymDictionary = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;
        debug!(entries = dictionary.len(), "loaded acronym dictionary");
        Ok(lookup_in(&dictionary, acronym))
    }
}

/// Case-insensitive lookup; the dictionary is keyed by upper-case acronyms.
pub fn lookup_in(dictionary: &AcronymDictionary, acronym: &str) -> Vec<String> {
    dictionary
        .get(&acronym.trim().to_uppercase())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> AcronymDictionary {
        serde_json::from_str(
            r#"{
                "ASDS": ["Autonomous Spaceport Drone Ship (landing platform)"],
                "RTLS": ["Return to Launch Site"],
                "BFR": ["Big Falcon Rocket (2017 enshrined)", "Big Falcon Rocket (earlier name)"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(lookup_in(&dictionary(), "rtls"), vec!["Return to Launch Site"]);
        assert_eq!(lookup_in(&dictionary(), " Asds "), dictionary()["ASDS"]);
    }

    #[test]
    fn multiple_definitions_are_kept_in_order() {
        let defs = lookup_in(&dictionary(), "BFR");
        assert_eq!(defs.len(), 2);
        assert!(defs[0].starts_with("Big Falcon"));
    }

    #[test]
    fn unknown_acronym_is_empty() {
        assert!(lookup_in(&dictionary(), "XYZZY").is_empty());
    }
}
