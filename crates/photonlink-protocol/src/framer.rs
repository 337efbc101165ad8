//! ---
//! pl_section: "01-wire-protocol"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "Byte-stream accumulator and 4-byte frame decoder."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
use bytes::{Buf, BytesMut};

use crate::codec::from_seven_bit_pair;

/// One decoded 4-byte unit of the incoming protocol:
/// `[action, pin, value_lsb, value_msb]`.
///
/// The action stays a raw byte here; unknown codes are the router's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Action byte, see [`crate::wire`].
    pub action: u8,
    /// Pin slot index, or a logical port number for port reports.
    pub pin: u8,
    /// 14-bit value reassembled from the 7-bit pair.
    pub value: u16,
}

/// Accumulates an arbitrarily chunked byte stream and drains it four bytes
/// at a time once complete frames are available.
///
/// Bytes that do not yet complete a frame stay queued indefinitely; there is
/// no checksum and no resynchronisation, so a single dropped byte misaligns
/// every subsequent frame. Known limitation of the wire format.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    queue: BytesMut,
}

impl FrameDecoder {
    /// Fresh decoder with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` to the queue, then drain frames while the queued
    /// length is a positive multiple of four. Frames come out in strict
    /// arrival order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.queue.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while !self.queue.is_empty() && self.queue.len() % 4 == 0 {
            let action = self.queue.get_u8();
            let pin = self.queue.get_u8();
            let lsb = self.queue.get_u8();
            let msb = self.queue.get_u8();
            frames.push(Frame {
                action,
                pin,
                value: from_seven_bit_pair(lsb, msb),
            });
        }
        frames
    }

    /// Number of buffered bytes still awaiting frame alignment.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire;

    fn frame_bytes(action: u8, pin: u8, value: u16) -> [u8; 4] {
        let pair = crate::codec::to_seven_bit_pair(value);
        [action, pin, pair[0], pair[1]]
    }

    #[test]
    fn whole_frames_decode_in_order() {
        let mut decoder = FrameDecoder::new();
        let mut stream = Vec::new();
        stream.extend_from_slice(&frame_bytes(wire::DIGITAL_READ, 2, 1));
        stream.extend_from_slice(&frame_bytes(wire::ANALOG_READ, 10, 4095));

        let frames = decoder.feed(&stream);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Frame { action: wire::DIGITAL_READ, pin: 2, value: 1 });
        assert_eq!(frames[1], Frame { action: wire::ANALOG_READ, pin: 10, value: 4095 });
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn partial_frames_stay_buffered_across_feeds() {
        let mut decoder = FrameDecoder::new();
        let bytes = frame_bytes(wire::DIGITAL_READ, 3, 1);

        assert!(decoder.feed(&bytes[..3]).is_empty());
        assert_eq!(decoder.pending(), 3);

        let frames = decoder.feed(&bytes[3..]);
        assert_eq!(frames, vec![Frame { action: wire::DIGITAL_READ, pin: 3, value: 1 }]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn split_points_do_not_change_the_decoded_sequence() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&frame_bytes(wire::DIGITAL_READ, 0, 1));
        stream.extend_from_slice(&frame_bytes(wire::REPORTING, 0, 0b101));
        stream.extend_from_slice(&frame_bytes(wire::ANALOG_READ, 14, 2048));

        let mut all_at_once = FrameDecoder::new();
        let expected = all_at_once.feed(&stream);
        assert_eq!(expected.len(), 3);

        for chunk_size in 1..stream.len() {
            let mut decoder = FrameDecoder::new();
            let mut frames = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                frames.extend(decoder.feed(chunk));
            }
            assert_eq!(frames, expected, "chunk size {chunk_size}");
            assert_eq!(decoder.pending(), 0);
        }
    }

    #[test]
    fn queue_only_drains_on_a_four_byte_boundary() {
        let mut decoder = FrameDecoder::new();
        let first = frame_bytes(wire::DIGITAL_READ, 1, 0);
        let second = frame_bytes(wire::DIGITAL_READ, 2, 1);

        // Six bytes hold one complete frame, but the queue length is not a
        // multiple of four so nothing is drained yet.
        let mut six = first.to_vec();
        six.extend_from_slice(&second[..2]);
        assert!(decoder.feed(&six).is_empty());
        assert_eq!(decoder.pending(), 6);

        let frames = decoder.feed(&second[2..]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].pin, 1);
        assert_eq!(frames[1].pin, 2);
    }
}
