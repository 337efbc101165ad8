//! ---
//! pl_section: "01-wire-protocol"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "Frame-to-event routing and the pin value cache."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
use tracing::debug;

use crate::codec::scale_analog;
use crate::framer::Frame;
use crate::pins::{Pin, PinTable, ANALOG_OFFSET};
use crate::wire;

/// Typed key a read subscription is registered under.
///
/// Digital reads can be reported on analog pins, so `Digital(Pin::Analog(n))`
/// is a valid key: it is what a port-wide report on the analog port fans out
/// to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// A digital reading for the named pin.
    Digital(Pin),
    /// An analog reading for the named pin.
    Analog(Pin),
}

/// One routed reading, dispatched to subscribers in frame-arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    /// Subscription key the event belongs to.
    pub key: EventKey,
    /// Reported value: raw for digital reads, 10-bit scaled for analog
    /// reads, the isolated bit for port-report fan-out.
    pub value: u16,
}

/// Maps decoded frames to typed events and caches the latest value onto the
/// addressed pin record.
#[derive(Debug, Default)]
pub struct EventRouter {
    table: PinTable,
}

impl EventRouter {
    /// Router over a fresh capability table.
    pub fn new(table: PinTable) -> Self {
        Self { table }
    }

    /// Read access to the pin table.
    pub fn table(&self) -> &PinTable {
        &self.table
    }

    /// Mutable access for the command path's own value/mode caching.
    pub fn table_mut(&mut self) -> &mut PinTable {
        &mut self.table
    }

    /// Route one frame. `has_listener` reports whether a subscription exists
    /// for a key; port-report bits without a listener are decoded but
    /// neither cached nor emitted. Unknown actions are dropped.
    pub fn route<F>(&mut self, frame: &Frame, has_listener: F) -> Vec<PinEvent>
    where
        F: Fn(EventKey) -> bool,
    {
        match frame.action {
            wire::REPORTING => self.route_port_report(frame, has_listener),
            wire::DIGITAL_READ => {
                let key = EventKey::Digital(Pin::Digital(frame.pin));
                self.table.record_value(frame.pin, frame.value);
                vec![PinEvent {
                    key,
                    value: frame.value,
                }]
            }
            wire::ANALOG_READ => {
                let offset_pin = frame.pin.saturating_sub(ANALOG_OFFSET);
                let value = scale_analog(frame.value);
                self.table.record_value(frame.pin, value);
                vec![PinEvent {
                    key: EventKey::Analog(Pin::Analog(offset_pin)),
                    value,
                }]
            }
            other => {
                debug!(action = other, pin = frame.pin, "dropping unrecognised frame");
                Vec::new()
            }
        }
    }

    /// Fan a port-wide digital report out into per-bit events. The pin byte
    /// is a logical port: 0 is the digital port, anything else the analog
    /// group, whose per-bit slots start at `10 * port`.
    fn route_port_report<F>(&mut self, frame: &Frame, has_listener: F) -> Vec<PinEvent>
    where
        F: Fn(EventKey) -> bool,
    {
        let port = frame.pin;
        let mut events = Vec::new();

        for bit in 0..8u8 {
            let pin = if port == 0 {
                Pin::Digital(bit)
            } else {
                Pin::Analog(bit)
            };
            let key = EventKey::Digital(pin);
            if !has_listener(key) {
                continue;
            }

            let index = u16::from(bit) + u16::from(ANALOG_OFFSET) * u16::from(port);
            let value = frame.value & (1 << bit);
            if let Ok(index) = u8::try_from(index) {
                self.table.record_value(index, value);
            }
            events.push(PinEvent { key, value });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn frame(action: u8, pin: u8, value: u16) -> Frame {
        Frame { action, pin, value }
    }

    fn listeners(keys: &[EventKey]) -> HashSet<EventKey> {
        keys.iter().copied().collect()
    }

    #[test]
    fn digital_read_frames_cache_and_emit_raw_values() {
        let mut router = EventRouter::new(PinTable::new());
        let events = router.route(&frame(wire::DIGITAL_READ, 3, 1), |_| false);
        assert_eq!(
            events,
            vec![PinEvent {
                key: EventKey::Digital(Pin::Digital(3)),
                value: 1
            }]
        );
        assert_eq!(router.table().value(3), 1);
    }

    #[test]
    fn analog_read_frames_are_scaled_and_renamed() {
        let mut router = EventRouter::new(PinTable::new());
        let events = router.route(&frame(wire::ANALOG_READ, 14, 4095), |_| false);
        assert_eq!(
            events,
            vec![PinEvent {
                key: EventKey::Analog(Pin::Analog(4)),
                value: 1023
            }]
        );
        assert_eq!(router.table().value(14), 1023);
    }

    #[test]
    fn port_report_fans_out_only_to_listened_bits() {
        let mut router = EventRouter::new(PinTable::new());
        let subscribed = listeners(&[
            EventKey::Digital(Pin::Digital(0)),
            EventKey::Digital(Pin::Digital(2)),
        ]);

        let events = router.route(&frame(wire::REPORTING, 0, 0b0000_0101), |key| {
            subscribed.contains(&key)
        });

        assert_eq!(
            events,
            vec![
                PinEvent {
                    key: EventKey::Digital(Pin::Digital(0)),
                    value: 1
                },
                PinEvent {
                    key: EventKey::Digital(Pin::Digital(2)),
                    value: 4
                },
            ]
        );
        assert_eq!(router.table().value(0), 1);
        assert_eq!(router.table().value(2), 4);
        // D1 had no listener: bit decoded but not cached.
        assert_eq!(router.table().value(1), 0);
    }

    #[test]
    fn analog_port_reports_address_the_analog_group() {
        let mut router = EventRouter::new(PinTable::new());
        let subscribed = listeners(&[EventKey::Digital(Pin::Analog(1))]);

        let events = router.route(&frame(wire::REPORTING, 1, 0b0000_0010), |key| {
            subscribed.contains(&key)
        });

        assert_eq!(
            events,
            vec![PinEvent {
                key: EventKey::Digital(Pin::Analog(1)),
                value: 2
            }]
        );
        assert_eq!(router.table().value(11), 2);
    }

    #[test]
    fn port_report_clears_a_previously_set_bit() {
        let mut router = EventRouter::new(PinTable::new());
        let subscribed = listeners(&[EventKey::Digital(Pin::Digital(0))]);
        let listening = |key: EventKey| subscribed.contains(&key);

        router.route(&frame(wire::REPORTING, 0, 1), listening);
        assert_eq!(router.table().value(0), 1);
        router.route(&frame(wire::REPORTING, 0, 0), listening);
        assert_eq!(router.table().value(0), 0);
    }

    #[test]
    fn unknown_actions_are_dropped_silently() {
        let mut router = EventRouter::new(PinTable::new());
        assert!(router.route(&frame(0x7e, 0, 42), |_| true).is_empty());
        assert_eq!(router.table().value(0), 0);
    }
}
