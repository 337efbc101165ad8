//! ---
//! pl_section: "03-device-client"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "Device connection and controller facade."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Client side of the photonlink device link.
//!
//! [`DeviceController::connect`] performs the one-shot cloud discovery
//! handshake, opens the persistent TCP connection to the device, and returns
//! the facade consumers drive: pin configuration, digital/analog/servo
//! writes, continuous-read subscriptions, the on-board RGB LED, and the
//! sampling interval. One controller owns one connection; there is no
//! reconnect path and no multi-device multiplexing.

pub mod config;
mod connection;
pub mod controller;
pub mod rgb;

use photonlink_cloud::CloudError;
use photonlink_protocol::ProtocolError;

/// Shared result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the device client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Discovery handshake failed; the controller never becomes ready.
    #[error(transparent)]
    Cloud(#[from] CloudError),
    /// A configuration request was rejected before reaching the wire.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// Socket-level failure while opening the device connection.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    /// The link's writer task is gone; the command was never queued.
    #[error("device link closed before the command could be queued")]
    ConnectionClosed,
    /// An RGB input could not be resolved into three channels.
    #[error("invalid rgb input: {0:?}")]
    InvalidRgb(String),
}

pub use config::ControllerConfig;
pub use controller::{DeviceController, LinkState, HIGH, LOW};
pub use photonlink_cloud::{DeviceEndpoint, DiscoveryClient, DEFAULT_API_BASE};
pub use photonlink_protocol::{EventKey, Pin, PinDescriptor, PinMode};
pub use rgb::{Rgb, RgbInput};
