//! ---
//! pl_section: "02-cloud-discovery"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "Cloud directory lookup translating device credentials into a TCP endpoint."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Service discovery for photonlink devices.
//!
//! A device is addressed by id + access token; the cloud directory service
//! translates that pair into the `host:port` the binary protocol listens on.
//! The handshake runs exactly once per controller instance — there is no
//! retry, backoff, or caching here.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, info};

/// Production cloud directory base URL.
pub const DEFAULT_API_BASE: &str = "https://api.particle.io";

/// Command marker the firmware variable endpoint answers with when the TCP
/// server firmware is loaded and reachable.
const VARIABLE_RETURN: &str = "VarReturn";

/// Shared result type for discovery operations.
pub type Result<T> = std::result::Result<T, CloudError>;

/// Failures of the discovery handshake. All of these leave the controller
/// permanently short of its ready state; none are retried.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// The directory service answered with a non-200 status.
    #[error("unable to reach the device cloud: status {status}")]
    Unreachable {
        /// HTTP status code received.
        status: u16,
    },
    /// The directory service answered 200 but the envelope carries an error.
    #[error("cloud error {code}: {description}")]
    Response {
        /// Cloud-provided error code.
        code: i64,
        /// Cloud-provided error description.
        description: String,
    },
    /// The envelope's command marker was not the variable-return marker.
    #[error("unable to reach device firmware, has the TCP server firmware been flashed?")]
    FirmwareHandshake,
    /// The envelope's result could not be parsed as `host:port`.
    #[error("malformed device endpoint: {0:?}")]
    BadEndpoint(String),
    /// HTTP transport failure (DNS, TLS, connection, body decode).
    #[error("cloud transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Resolved address of the device's binary protocol server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    /// Host or IP the device listens on.
    pub host: String,
    /// TCP port of the binary protocol.
    pub port: u16,
}

impl fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for DeviceEndpoint {
    type Err = CloudError;

    fn from_str(raw: &str) -> Result<Self> {
        let bad = || CloudError::BadEndpoint(raw.to_string());
        let (host, port) = raw.rsplit_once(':').ok_or_else(bad)?;
        if host.is_empty() {
            return Err(bad());
        }
        let port = port.parse().map_err(|_| bad())?;
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

/// JSON envelope returned by the directory service's variable endpoint.
#[derive(Debug, Deserialize)]
struct EndpointEnvelope {
    cmd: Option<String>,
    result: Option<String>,
    error: Option<String>,
    #[serde(default)]
    code: i64,
    error_description: Option<String>,
}

/// One-shot discovery client over the cloud directory HTTP API.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    http: reqwest::Client,
    api_base: String,
}

impl Default for DiscoveryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryClient {
    /// Client against the production directory service.
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    /// Client against an alternative directory base URL (tests, private
    /// clouds). Trailing slashes are tolerated.
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Ask the directory service for the device's binary protocol endpoint.
    ///
    /// The access token travels as a query credential and is never logged.
    pub async fn resolve(&self, device_id: &str, token: &str) -> Result<DeviceEndpoint> {
        let url = format!("{}/v1/devices/{}/endpoint", self.api_base, device_id);
        debug!(%url, "requesting device endpoint");

        let response = self
            .http
            .get(&url)
            .query(&[("access_token", token)])
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(CloudError::Unreachable {
                status: status.as_u16(),
            });
        }

        let envelope: EndpointEnvelope = response.json().await?;
        if let Some(error) = envelope.error {
            return Err(CloudError::Response {
                code: envelope.code,
                description: envelope.error_description.unwrap_or(error),
            });
        }
        if envelope.cmd.as_deref() != Some(VARIABLE_RETURN) {
            return Err(CloudError::FirmwareHandshake);
        }

        let endpoint: DeviceEndpoint = envelope
            .result
            .as_deref()
            .unwrap_or_default()
            .parse()?;
        info!(device = %device_id, endpoint = %endpoint, "device endpoint resolved");
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_strings_parse_host_and_port() {
        let endpoint: DeviceEndpoint = "10.0.0.12:8001".parse().unwrap();
        assert_eq!(endpoint.host, "10.0.0.12");
        assert_eq!(endpoint.port, 8001);
        assert_eq!(endpoint.to_string(), "10.0.0.12:8001");
    }

    #[test]
    fn malformed_endpoints_are_rejected() {
        for raw in ["", "10.0.0.12", ":8001", "10.0.0.12:notaport", "10.0.0.12:99999"] {
            assert!(raw.parse::<DeviceEndpoint>().is_err(), "{raw:?} should fail");
        }
    }

    #[test]
    fn success_envelope_deserialises() {
        let envelope: EndpointEnvelope = serde_json::from_str(
            r#"{"cmd":"VarReturn","name":"endpoint","result":"192.168.1.40:8001"}"#,
        )
        .unwrap();
        assert_eq!(envelope.cmd.as_deref(), Some(VARIABLE_RETURN));
        assert_eq!(envelope.result.as_deref(), Some("192.168.1.40:8001"));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn error_envelope_deserialises() {
        let envelope: EndpointEnvelope = serde_json::from_str(
            r#"{"error":"invalid_grant","code":400,"error_description":"token expired"}"#,
        )
        .unwrap();
        assert_eq!(envelope.error.as_deref(), Some("invalid_grant"));
        assert_eq!(envelope.code, 400);
        assert_eq!(envelope.error_description.as_deref(), Some("token expired"));
    }

    #[test]
    fn api_base_trailing_slash_is_tolerated() {
        let client = DiscoveryClient::with_api_base("http://127.0.0.1:9000/");
        assert_eq!(client.api_base, "http://127.0.0.1:9000");
    }
}
