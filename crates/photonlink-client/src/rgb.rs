//! ---
//! pl_section: "03-device-client"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "On-board RGB LED state and input forms."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Channel state of the device's on-board RGB LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel, 0–255.
    pub red: u8,
    /// Green channel, 0–255.
    pub green: u8,
    /// Blue channel, 0–255.
    pub blue: u8,
}

impl Rgb {
    /// Build an [`Rgb`] from its three channels.
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Accepted input shapes for [`DeviceController::internal_rgb`], resolved
/// into [`Rgb`] once at the call boundary. Channels are `u8`, so the 0–255
/// clamp is enforced by the type.
///
/// [`DeviceController::internal_rgb`]: crate::DeviceController::internal_rgb
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RgbInput {
    /// Three channel values, `internal_rgb((255, 128, 0))`.
    Triple(u8, u8, u8),
    /// A channel array, `internal_rgb([255, 128, 0])`.
    Channels([u8; 3]),
    /// A named channel struct, `internal_rgb(Rgb { .. })`.
    Named(Rgb),
    /// Six hex digits with an optional leading `#`, `internal_rgb("#ff8000")`.
    Hex(String),
}

impl RgbInput {
    /// Collapse the input into channel values; only the hex form can fail.
    pub(crate) fn resolve(self) -> Result<Rgb, ClientError> {
        match self {
            RgbInput::Triple(red, green, blue) => Ok(Rgb::new(red, green, blue)),
            RgbInput::Channels([red, green, blue]) => Ok(Rgb::new(red, green, blue)),
            RgbInput::Named(rgb) => Ok(rgb),
            RgbInput::Hex(raw) => parse_hex(&raw),
        }
    }
}

fn parse_hex(raw: &str) -> Result<Rgb, ClientError> {
    let invalid = || ClientError::InvalidRgb(raw.to_string());
    let digits = raw.strip_prefix('#').unwrap_or(raw);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }
    let channel =
        |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).map_err(|_| invalid());
    Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

impl From<(u8, u8, u8)> for RgbInput {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        RgbInput::Triple(red, green, blue)
    }
}

impl From<[u8; 3]> for RgbInput {
    fn from(channels: [u8; 3]) -> Self {
        RgbInput::Channels(channels)
    }
}

impl From<Rgb> for RgbInput {
    fn from(rgb: Rgb) -> Self {
        RgbInput::Named(rgb)
    }
}

impl From<&str> for RgbInput {
    fn from(raw: &str) -> Self {
        RgbInput::Hex(raw.to_string())
    }
}

impl From<String> for RgbInput {
    fn from(raw: String) -> Self {
        RgbInput::Hex(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_input_form_resolves_to_the_same_channels() {
        let expected = Rgb::new(255, 128, 0);
        let forms: Vec<RgbInput> = vec![
            (255, 128, 0).into(),
            [255, 128, 0].into(),
            expected.into(),
            "#ff8000".into(),
            "ff8000".into(),
            "FF8000".into(),
        ];
        for form in forms {
            assert_eq!(form.resolve().unwrap(), expected);
        }
    }

    #[test]
    fn malformed_hex_strings_are_rejected() {
        for raw in ["", "#", "ff80", "#ff80000", "gg8000", "#ff 800"] {
            let input = RgbInput::from(raw);
            assert!(
                matches!(input.resolve(), Err(ClientError::InvalidRgb(_))),
                "{raw:?} should be rejected"
            );
        }
    }
}
