//! ---
//! pl_section: "01-wire-protocol"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "Pin identifiers, modes, and the capability table."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Total pin slots exposed by the device, reserved slots included.
pub const PIN_COUNT: usize = 18;

/// Index of the first analog pin; `An` maps to slot `n + ANALOG_OFFSET`.
pub const ANALOG_OFFSET: u8 = 10;

/// Operating modes a pin can be placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinMode {
    /// Digital input.
    Input,
    /// Digital output.
    Output,
    /// Analog input.
    Analog,
    /// Pulse-width modulated output.
    Pwm,
    /// Servo pulse output.
    Servo,
}

impl PinMode {
    /// Protocol code for this mode.
    pub fn code(self) -> u8 {
        match self {
            PinMode::Input => 0x00,
            PinMode::Output => 0x01,
            PinMode::Analog => 0x02,
            PinMode::Pwm => 0x03,
            PinMode::Servo => 0x04,
        }
    }

    /// Code actually sent in a pin-mode command. PWM writes are executed via
    /// analog-write on the firmware side, so PWM is transmitted as OUTPUT;
    /// the descriptor keeps recording the mode the caller asked for.
    pub fn wire_code(self) -> u8 {
        match self {
            PinMode::Pwm => PinMode::Output.code(),
            other => other.code(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            PinMode::Input => "INPUT",
            PinMode::Output => "OUTPUT",
            PinMode::Analog => "ANALOG",
            PinMode::Pwm => "PWM",
            PinMode::Servo => "SERVO",
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed pin identifier. Digital pins occupy slots 0–9 (8 and 9 reserved),
/// analog pins slots 10–17.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pin {
    /// `Dn` — digital pin `n`.
    Digital(u8),
    /// `An` — analog pin `n`, slot `n + 10`.
    Analog(u8),
}

impl Pin {
    /// Digital pin constructor, `Dn`.
    pub fn digital(n: u8) -> Self {
        Pin::Digital(n)
    }

    /// Analog pin constructor, `An`. Numeric shorthand for inherently analog
    /// operations resolves through this.
    pub fn analog(n: u8) -> Self {
        Pin::Analog(n)
    }

    /// Slot index used on the wire and in the capability table.
    pub fn index(self) -> u8 {
        match self {
            Pin::Digital(n) => n,
            Pin::Analog(n) => n + ANALOG_OFFSET,
        }
    }

    /// Reverse mapping from a slot index.
    pub fn from_index(index: u8) -> Self {
        if index >= ANALOG_OFFSET {
            Pin::Analog(index - ANALOG_OFFSET)
        } else {
            Pin::Digital(index)
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pin::Digital(n) => write!(f, "D{n}"),
            Pin::Analog(n) => write!(f, "A{n}"),
        }
    }
}

impl FromStr for Pin {
    type Err = ProtocolError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidPin(raw.to_string());
        let mut chars = raw.trim().chars();
        let prefix = chars.next().ok_or_else(invalid)?;
        let number: u8 = chars.as_str().parse().map_err(|_| invalid())?;
        // Keep the number inside the slot range so `index()` cannot wrap.
        match prefix {
            'D' | 'd' if usize::from(number) < PIN_COUNT => Ok(Pin::Digital(number)),
            'A' | 'a' if usize::from(number) < PIN_COUNT - usize::from(ANALOG_OFFSET) => {
                Ok(Pin::Analog(number))
            }
            _ => Err(invalid()),
        }
    }
}

/// Per-pin record: printable name, capability set, the mode the caller last
/// requested, and the last written or observed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinDescriptor {
    /// Printable name (`D0`, `A3`); empty for reserved slots.
    pub name: &'static str,
    /// Modes this pin accepts.
    pub supported_modes: &'static [PinMode],
    /// Mode recorded for the pin, `None` until one is set on a reserved slot.
    pub mode: Option<PinMode>,
    /// Last value written to or reported for the pin.
    pub value: u16,
}

impl PinDescriptor {
    fn new(name: &'static str, supported_modes: &'static [PinMode]) -> Self {
        Self {
            name,
            supported_modes,
            mode: supported_modes.first().copied(),
            value: 0,
        }
    }
}

const DIGITAL_IO: &[PinMode] = &[PinMode::Input, PinMode::Output];
const DIGITAL_FULL: &[PinMode] = &[PinMode::Input, PinMode::Output, PinMode::Pwm, PinMode::Servo];
const ANALOG_IO: &[PinMode] = &[PinMode::Input, PinMode::Output, PinMode::Analog];
const ANALOG_FULL: &[PinMode] = &[
    PinMode::Input,
    PinMode::Output,
    PinMode::Analog,
    PinMode::Pwm,
    PinMode::Servo,
];
const RESERVED: &[PinMode] = &[];

/// Capability map for the 18 pin slots. Slots 8 and 9 are reserved and
/// accept no mode at all.
///
/// True PWM has only been confirmed on D0, D1, A0, A1 and A5 even though the
/// table advertises PWM more broadly (A4, A6, A7); the table stays
/// authoritative for validation until firmware documentation settles it.
const CAPABILITIES: [(&str, &[PinMode]); PIN_COUNT] = [
    ("D0", DIGITAL_FULL),
    ("D1", DIGITAL_FULL),
    ("D2", DIGITAL_IO),
    ("D3", DIGITAL_IO),
    ("D4", DIGITAL_IO),
    ("D5", DIGITAL_IO),
    ("D6", DIGITAL_IO),
    ("D7", DIGITAL_IO),
    ("", RESERVED),
    ("", RESERVED),
    ("A0", ANALOG_FULL),
    ("A1", ANALOG_FULL),
    ("A2", ANALOG_IO),
    ("A3", ANALOG_IO),
    ("A4", ANALOG_FULL),
    ("A5", ANALOG_FULL),
    ("A6", ANALOG_FULL),
    ("A7", ANALOG_FULL),
];

/// Mutable view over the 18 pin slots: capabilities plus live mode/value
/// cache. One instance per device connection.
#[derive(Debug, Clone)]
pub struct PinTable {
    pins: Vec<PinDescriptor>,
}

impl Default for PinTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PinTable {
    /// Build a fresh table from the static capability map.
    pub fn new() -> Self {
        Self {
            pins: CAPABILITIES
                .iter()
                .map(|(name, modes)| PinDescriptor::new(name, modes))
                .collect(),
        }
    }

    /// Borrow the descriptor at `index`. Index validity is the caller's
    /// responsibility, matching the wire contract.
    pub fn descriptor(&self, index: u8) -> &PinDescriptor {
        &self.pins[index as usize]
    }

    /// Clone the full descriptor set, e.g. for CLI display.
    pub fn snapshot(&self) -> Vec<PinDescriptor> {
        self.pins.clone()
    }

    /// Logical indexes (0–7) of the analog pin group.
    pub fn analog_pin_indexes(&self) -> Vec<u8> {
        (0..(PIN_COUNT as u8 - ANALOG_OFFSET)).collect()
    }

    /// Reject `mode` unless the pin's capability set carries it. This is the
    /// only validation the configuration path performs and it must happen
    /// before any bytes reach the wire.
    pub fn validate_mode(&self, pin: Pin, mode: PinMode) -> crate::Result<()> {
        let descriptor = self.descriptor(pin.index());
        if descriptor.supported_modes.contains(&mode) {
            Ok(())
        } else {
            Err(ProtocolError::UnsupportedMode {
                pin: pin.to_string(),
                mode,
            })
        }
    }

    /// Record the mode the caller asked for (PWM stays PWM here even though
    /// it is normalised to OUTPUT on the wire).
    pub fn record_mode(&mut self, index: u8, mode: PinMode) {
        self.pins[index as usize].mode = Some(mode);
    }

    /// Cache the latest written or reported value for a slot. Out-of-range
    /// indexes (a port report beyond the table) are ignored.
    pub fn record_value(&mut self, index: u8, value: u16) {
        if let Some(descriptor) = self.pins.get_mut(index as usize) {
            descriptor.value = value;
        }
    }

    /// Last cached value for a slot.
    pub fn value(&self, index: u8) -> u16 {
        self.pins[index as usize].value
    }
}
