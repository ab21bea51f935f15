//! Framing codec for the radio file stream
//!
//! Three control frames share the stream with raw data packets. A control
//! frame starts with a one byte tag:
//!
//! | Tag  | Frame | Payload                                             |
//! |------|-------|-----------------------------------------------------|
//! | 0x01 | START | u32 big-endian file size, file name, NUL if it fits |
//! | 0x02 | END   | none                                                |
//! | 0xFF | ERROR | none                                                |
//!
//! Data packets carry no framing byte. The name in a START frame is cut to
//! whatever fits in one radio packet.

use smallvec::SmallVec;
use tracing::warn;

use crate::errors::{FrameError, TransportError};
use crate::types::truncate_utf8;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// START control tag
pub const CONTROL_START: u8 = 0x01;

/// END control tag
pub const CONTROL_END: u8 = 0x02;

/// ERROR control tag
pub const CONTROL_ERROR: u8 = 0xFF;

/// Tag plus the 4 byte size field
pub const START_HEADER_LEN: usize = 5;

/// Radio packet size of the reference link profile
pub const DEFAULT_MAX_PACKET_SIZE: u16 = 20;

/// One encoded radio packet, inline up to the reference packet size
pub type Packet = SmallVec<[u8; DEFAULT_MAX_PACKET_SIZE as usize]>;

// ----------------------------------------------------------------------------
// Control Frames
// ----------------------------------------------------------------------------

/// A tagged control frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFrame {
    /// Announces a file: declared size and display name
    Start { file_size: u32, file_name: String },
    /// All data has been sent
    End,
    /// The sender abandoned the transfer
    Error,
}

impl ControlFrame {
    /// Wire tag of this frame
    pub fn tag(&self) -> u8 {
        match self {
            ControlFrame::Start { .. } => CONTROL_START,
            ControlFrame::End => CONTROL_END,
            ControlFrame::Error => CONTROL_ERROR,
        }
    }

    /// Frame name for logging
    pub fn name(&self) -> &'static str {
        match self {
            ControlFrame::Start { .. } => "START",
            ControlFrame::End => "END",
            ControlFrame::Error => "ERROR",
        }
    }

    /// Encode into a single radio packet of at most `max_packet_size` bytes
    pub fn encode(&self, max_packet_size: usize) -> Result<Packet, FrameError> {
        match self {
            ControlFrame::Start {
                file_size,
                file_name,
            } => encode_start(*file_size, file_name, max_packet_size),
            other => {
                if max_packet_size == 0 {
                    return Err(FrameError::PacketTooSmall { max_packet_size });
                }
                let mut packet = Packet::new();
                packet.push(other.tag());
                Ok(packet)
            }
        }
    }

    /// Parse a packet that is known to be a control frame
    pub fn decode(packet: &[u8]) -> Result<Self, FrameError> {
        let (&tag, rest) = packet.split_first().ok_or(FrameError::Empty)?;

        match tag {
            CONTROL_START => {
                if packet.len() < START_HEADER_LEN {
                    return Err(FrameError::Truncated {
                        expected: START_HEADER_LEN,
                        actual: packet.len(),
                    });
                }
                let file_size = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
                let name_bytes = &rest[4..];
                let name_end = name_bytes
                    .iter()
                    .position(|&b| b == 0)
                    .unwrap_or(name_bytes.len());
                let file_name = String::from_utf8_lossy(&name_bytes[..name_end]).into_owned();
                Ok(ControlFrame::Start {
                    file_size,
                    file_name,
                })
            }
            CONTROL_END => Ok(ControlFrame::End),
            CONTROL_ERROR => Ok(ControlFrame::Error),
            tag => Err(FrameError::UnknownTag { tag }),
        }
    }
}

/// Longest name a START frame can carry, leaving room for the terminator
///
/// `None` when the packet cannot even hold the header.
pub fn max_start_name_len(max_packet_size: usize) -> Option<usize> {
    if max_packet_size < START_HEADER_LEN {
        return None;
    }
    Some(max_packet_size.saturating_sub(START_HEADER_LEN + 1))
}

/// Build a START packet
///
/// The packet is `5 + name_len + 1` bytes long, or just the 5 byte header
/// when the packet has no room for a terminator. A name that does not fit is
/// truncated on a character boundary and the truncation is only logged.
pub fn encode_start(
    file_size: u32,
    file_name: &str,
    max_packet_size: usize,
) -> Result<Packet, FrameError> {
    let max_name_len =
        max_start_name_len(max_packet_size).ok_or(FrameError::PacketTooSmall { max_packet_size })?;

    let name = truncate_utf8(file_name, max_name_len);
    if name.len() < file_name.len() {
        warn!(
            "File name truncated for radio transfer: {} -> {} bytes",
            file_name.len(),
            name.len()
        );
    }

    let mut packet = Packet::with_capacity(START_HEADER_LEN + name.len() + 1);
    packet.push(CONTROL_START);
    packet.extend_from_slice(&file_size.to_be_bytes());
    packet.extend_from_slice(name.as_bytes());
    if packet.len() < max_packet_size {
        packet.push(0);
    }
    Ok(packet)
}

/// Check a packet length against the link's packet capacity
pub fn check_packet_size(len: usize, max_packet_size: usize) -> Result<(), TransportError> {
    if len > max_packet_size {
        return Err(TransportError::PacketTooLarge {
            size: len,
            max_size: max_packet_size,
        });
    }
    Ok(())
}

/// Number of data packets needed for `file_size` bytes
pub fn total_chunks(file_size: u64, chunk_size: usize) -> u32 {
    if chunk_size == 0 {
        return 0;
    }
    file_size.div_ceil(chunk_size as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_frame_layout() {
        let packet = encode_start(45, "notes.txt", 20).unwrap();
        assert_eq!(packet[0], CONTROL_START);
        assert_eq!(&packet[1..5], &[0, 0, 0, 45]);
        assert_eq!(&packet[5..14], b"notes.txt");
        assert_eq!(packet[14], 0);
        assert_eq!(packet.len(), 5 + 9 + 1);
    }

    #[test]
    fn test_start_frame_truncates_long_name() {
        let packet = encode_start(1, "a_really_long_document_name.txt", 20).unwrap();
        assert_eq!(packet.len(), 20);
        assert_eq!(&packet[5..19], b"a_really_long_");
        assert_eq!(packet[19], 0);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // 13 ASCII bytes then a 3 byte character straddling the 14 byte budget
        let name = "abcdefghijklm\u{20ac}";
        let packet = encode_start(0, name, 20).unwrap();
        let decoded = ControlFrame::decode(&packet).unwrap();
        assert_eq!(
            decoded,
            ControlFrame::Start {
                file_size: 0,
                file_name: "abcdefghijklm".to_string()
            }
        );
    }

    #[test]
    fn test_start_frame_needs_room() {
        assert_eq!(
            encode_start(1, "x", 4),
            Err(FrameError::PacketTooSmall { max_packet_size: 4 })
        );
        let packet = encode_start(7, "ignored", 6).unwrap();
        assert_eq!(packet.as_slice(), &[CONTROL_START, 0, 0, 0, 7, 0]);
    }

    #[test]
    fn test_header_only_start_frame() {
        let packet = encode_start(300, "dropped.txt", 5).unwrap();
        assert_eq!(packet.as_slice(), &[CONTROL_START, 0, 0, 1, 44]);
        assert_eq!(
            ControlFrame::decode(&packet),
            Ok(ControlFrame::Start {
                file_size: 300,
                file_name: String::new()
            })
        );
    }

    #[test]
    fn test_end_and_error_frames() {
        assert_eq!(ControlFrame::End.encode(20).unwrap().as_slice(), &[0x02]);
        assert_eq!(ControlFrame::Error.encode(20).unwrap().as_slice(), &[0xFF]);
        assert_eq!(ControlFrame::decode(&[0x02]), Ok(ControlFrame::End));
        assert_eq!(ControlFrame::decode(&[0xFF]), Ok(ControlFrame::Error));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(ControlFrame::decode(&[]), Err(FrameError::Empty));
        assert_eq!(
            ControlFrame::decode(&[0x01, 0, 0]),
            Err(FrameError::Truncated {
                expected: 5,
                actual: 3
            })
        );
        assert_eq!(
            ControlFrame::decode(&[0x42]),
            Err(FrameError::UnknownTag { tag: 0x42 })
        );
    }

    #[test]
    fn test_decode_start_without_terminator() {
        let decoded = ControlFrame::decode(&[0x01, 0, 0, 1, 0, b'a', b'b']).unwrap();
        assert_eq!(
            decoded,
            ControlFrame::Start {
                file_size: 256,
                file_name: "ab".to_string()
            }
        );
    }

    #[test]
    fn test_total_chunks() {
        assert_eq!(total_chunks(0, 20), 0);
        assert_eq!(total_chunks(20, 20), 1);
        assert_eq!(total_chunks(45, 20), 3);
        assert_eq!(total_chunks(u32::MAX as u64, 20), 214_748_365);
    }

    #[test]
    fn test_check_packet_size() {
        assert!(check_packet_size(20, 20).is_ok());
        assert_eq!(
            check_packet_size(21, 20),
            Err(TransportError::PacketTooLarge {
                size: 21,
                max_size: 20
            })
        );
    }
}
