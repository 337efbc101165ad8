//! ---
//! pl_section: "01-wire-protocol"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "Wire protocol primitives for photonlink devices."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Protocol layer for the photonlink binary device link.
//!
//! Everything in this crate is synchronous and I/O free: the pin capability
//! table and typed pin identifiers, the 7-bit pair value codec, the 4-byte
//! frame decoder, and the router that turns decoded frames into typed read
//! events. The client crate owns the socket and feeds bytes through here.

pub mod codec;
pub mod events;
pub mod framer;
pub mod pins;
pub mod wire;

/// Shared result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised by the protocol layer before anything touches the wire.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A pin was asked to enter a mode outside its capability set.
    #[error("unsupported pin mode: {mode} for {pin}")]
    UnsupportedMode {
        /// Printable pin name, e.g. `D3`.
        pin: String,
        /// The rejected mode.
        mode: pins::PinMode,
    },
    /// A pin identifier string could not be parsed.
    #[error("unrecognised pin identifier: {0:?}")]
    InvalidPin(String),
}

pub use codec::{from_seven_bit_bytes, from_seven_bit_pair, scale_analog, to_seven_bit_pair};
pub use events::{EventKey, EventRouter, PinEvent};
pub use framer::{Frame, FrameDecoder};
pub use pins::{Pin, PinDescriptor, PinMode, PinTable, ANALOG_OFFSET, PIN_COUNT};
