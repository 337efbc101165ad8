//! ---
//! pl_section: "01-wire-protocol"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "Action byte constants for the device link."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
//! Action bytes of the fixed-format command protocol.
//!
//! Outgoing commands are written verbatim as `[action, …payload]`; incoming
//! traffic is strictly 4-byte frames `[action, pin, value_lsb, value_msb]`.

/// Set pin mode: `[PIN_MODE, pin_index, wire_mode]`.
pub const PIN_MODE: u8 = 0x00;
/// Digital write: `[DIGITAL_WRITE, pin_index, value]`.
pub const DIGITAL_WRITE: u8 = 0x01;
/// Analog (PWM) write: `[ANALOG_WRITE, pin_index, value]`.
pub const ANALOG_WRITE: u8 = 0x02;
/// Incoming digital read frame.
pub const DIGITAL_READ: u8 = 0x03;
/// Incoming analog read frame.
pub const ANALOG_READ: u8 = 0x04;
/// Outgoing: request a continuous read (`[REPORTING, pin_index, 1|2]`).
/// Incoming: port-wide digital report whose value is an 8-bit mask.
pub const REPORTING: u8 = 0x05;
/// Set sampling interval: `[SAMPLE_INTERVAL, lsb, msb]` (7-bit pair).
pub const SAMPLE_INTERVAL: u8 = 0x06;
/// Set the on-board RGB LED: `[INTERNAL_RGB, r, g, b]`.
pub const INTERNAL_RGB: u8 = 0x07;
/// Servo write: `[SERVO_WRITE, pin_index, degrees]`.
pub const SERVO_WRITE: u8 = 0x41;

/// Continuous-read payload selector for digital pins.
pub const READ_DIGITAL: u8 = 1;
/// Continuous-read payload selector for analog pins.
pub const READ_ANALOG: u8 = 2;
