//! ---
//! pl_section: "03-device-client"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "Controller configuration."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
use serde::Deserialize;

use photonlink_cloud::DEFAULT_API_BASE;

/// Credentials and endpoints a controller needs to come up.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// Cloud-registered device identifier.
    pub device_id: String,
    /// Access token passed to the directory service as a query credential.
    pub access_token: String,
    /// Directory service base URL; defaults to the production cloud.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl ControllerConfig {
    /// Configuration against the production cloud.
    pub fn new(device_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            access_token: access_token.into(),
            api_base: default_api_base(),
        }
    }

    /// Point discovery at an alternative directory service (tests, private
    /// clouds).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_production_cloud() {
        let config = ControllerConfig::new("abc123", "token");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn api_base_override_and_serde_default() {
        let config = ControllerConfig::new("abc123", "token").with_api_base("http://localhost:1");
        assert_eq!(config.api_base, "http://localhost:1");

        let parsed: ControllerConfig =
            serde_json::from_str(r#"{"device_id":"abc123","access_token":"token"}"#).unwrap();
        assert_eq!(parsed.api_base, DEFAULT_API_BASE);
    }
}
