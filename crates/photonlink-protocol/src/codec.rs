//! ---
//! pl_section: "01-wire-protocol"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "7-bit pair value codec and analog scaling."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
//! The protocol carries every value wider than 7 bits as two bytes that each
//! use only their low 7 bits, giving a 14-bit range of 0–16383.

/// Split a value into its `[lsb, msb]` 7-bit pair. Bits above 14 are
/// discarded.
pub fn to_seven_bit_pair(value: u16) -> [u8; 2] {
    [(value & 0x7f) as u8, ((value >> 7) & 0x7f) as u8]
}

/// Reassemble a value from its 7-bit pair.
pub fn from_seven_bit_pair(lsb: u8, msb: u8) -> u16 {
    u16::from(lsb) | (u16::from(msb) << 7)
}

/// Pair-array form of [`from_seven_bit_pair`].
pub fn from_seven_bit_bytes(pair: [u8; 2]) -> u16 {
    from_seven_bit_pair(pair[0], pair[1])
}

/// Compress a native-resolution analog reading to the 10-bit convention
/// consumers expect.
pub fn scale_analog(value: u16) -> u16 {
    value >> 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seven_bit_pair_round_trips_the_full_range() {
        for value in 0..=0x3fffu16 {
            let pair = to_seven_bit_pair(value);
            assert!(pair[0] <= 0x7f && pair[1] <= 0x7f);
            assert_eq!(from_seven_bit_bytes(pair), value);
        }
    }

    #[test]
    fn encoding_masks_bits_above_fourteen() {
        assert_eq!(to_seven_bit_pair(0x3fff), [0x7f, 0x7f]);
        assert_eq!(from_seven_bit_bytes(to_seven_bit_pair(0x4001)), 1);
    }

    #[test]
    fn small_values_fit_in_the_low_byte() {
        assert_eq!(to_seven_bit_pair(10), [10, 0]);
        assert_eq!(to_seven_bit_pair(128), [0, 1]);
        assert_eq!(from_seven_bit_pair(0, 1), 128);
    }

    #[test]
    fn analog_scaling_drops_two_bits() {
        assert_eq!(scale_analog(4095), 1023);
        assert_eq!(scale_analog(3), 0);
        assert_eq!(scale_analog(1024), 256);
    }
}
