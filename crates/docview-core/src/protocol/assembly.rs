//! Receive-side reassembly
//!
//! The peer's half of the framing codec: a START frame, exactly the declared
//! number of raw data bytes, then END. Data packets carry no tag, so while
//! bytes are outstanding every packet counts as data, except a lone `0xFF`
//! byte when more than one byte is still expected, which can only be the
//! sender abandoning the file.

use tracing::{debug, warn};

use crate::errors::FrameError;
use crate::protocol::frame::{ControlFrame, CONTROL_ERROR};

/// A completely received file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    pub name: String,
    pub data: Vec<u8>,
}

/// Result of feeding one packet to the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyEvent {
    /// A START frame opened a new file
    Started { name: String, size: u32 },
    /// Data bytes were appended
    Progress { received: u32, size: u32 },
    /// END closed a file whose data was complete
    Completed(ReceivedFile),
    /// The sender abandoned the file; partial data was dropped
    Aborted(String),
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Idle,
    Receiving {
        name: String,
        size: u32,
        data: Vec<u8>,
    },
    AwaitingEnd {
        name: String,
        data: Vec<u8>,
    },
}

const IDLE: &str = "idle";
const AWAITING_END: &str = "awaiting END";

/// Rebuilds files from the packet stream
///
/// Any framing error drops the partial file and returns the assembler to
/// idle, ready for the next START.
#[derive(Debug, Default)]
pub struct FileAssembler {
    phase: Phase,
}

impl FileAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no file is open
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Bytes received for the open file
    pub fn received(&self) -> usize {
        match &self.phase {
            Phase::Idle => 0,
            Phase::Receiving { data, .. } | Phase::AwaitingEnd { data, .. } => data.len(),
        }
    }

    /// Feed one radio packet
    pub fn push(&mut self, packet: &[u8]) -> Result<AssemblyEvent, FrameError> {
        let result = match std::mem::take(&mut self.phase) {
            Phase::Idle => self.on_idle(packet),
            Phase::Receiving { name, size, data } => self.on_data(packet, name, size, data),
            Phase::AwaitingEnd { name, data } => self.on_awaiting_end(packet, name, data),
        };

        if let Err(e) = &result {
            warn!("Dropping partial file: {}", e);
            self.phase = Phase::Idle;
        }
        result
    }

    fn on_idle(&mut self, packet: &[u8]) -> Result<AssemblyEvent, FrameError> {
        match ControlFrame::decode(packet)? {
            ControlFrame::Start {
                file_size,
                file_name,
            } => {
                debug!("Receiving {} ({} bytes)", file_name, file_size);
                self.phase = if file_size == 0 {
                    Phase::AwaitingEnd {
                        name: file_name.clone(),
                        data: Vec::new(),
                    }
                } else {
                    Phase::Receiving {
                        name: file_name.clone(),
                        size: file_size,
                        data: Vec::with_capacity(file_size as usize),
                    }
                };
                Ok(AssemblyEvent::Started {
                    name: file_name,
                    size: file_size,
                })
            }
            ControlFrame::Error => Ok(AssemblyEvent::Aborted(
                "ERROR frame with no file open".to_string(),
            )),
            other => Err(FrameError::UnexpectedFrame {
                frame: other.name(),
                phase: IDLE,
            }),
        }
    }

    fn on_data(
        &mut self,
        packet: &[u8],
        name: String,
        size: u32,
        mut data: Vec<u8>,
    ) -> Result<AssemblyEvent, FrameError> {
        let outstanding = size as usize - data.len();

        if packet == [CONTROL_ERROR] && outstanding > 1 {
            return Ok(AssemblyEvent::Aborted(format!(
                "sender aborted {} after {} of {} bytes",
                name,
                data.len(),
                size
            )));
        }
        if packet.is_empty() {
            return Err(FrameError::Empty);
        }
        if packet.len() > outstanding {
            return Err(FrameError::Overflow {
                extra: packet.len() - outstanding,
            });
        }

        data.extend_from_slice(packet);
        let received = data.len() as u32;
        self.phase = if received == size {
            Phase::AwaitingEnd { name, data }
        } else {
            Phase::Receiving { name, size, data }
        };
        Ok(AssemblyEvent::Progress { received, size })
    }

    fn on_awaiting_end(
        &mut self,
        packet: &[u8],
        name: String,
        data: Vec<u8>,
    ) -> Result<AssemblyEvent, FrameError> {
        match ControlFrame::decode(packet)? {
            ControlFrame::End => Ok(AssemblyEvent::Completed(ReceivedFile { name, data })),
            ControlFrame::Error => Ok(AssemblyEvent::Aborted(format!(
                "sender aborted {} before END",
                name
            ))),
            other => Err(FrameError::UnexpectedFrame {
                frame: other.name(),
                phase: AWAITING_END,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::{encode_start, CONTROL_END};

    fn start(size: u32, name: &str) -> Vec<u8> {
        encode_start(size, name, 20).unwrap().to_vec()
    }

    #[test]
    fn test_reassembles_file() {
        let data: Vec<u8> = (0..45).collect();
        let mut assembler = FileAssembler::new();

        assert_eq!(
            assembler.push(&start(45, "doc.txt")).unwrap(),
            AssemblyEvent::Started {
                name: "doc.txt".to_string(),
                size: 45
            }
        );
        for chunk in data.chunks(20) {
            assert!(matches!(
                assembler.push(chunk).unwrap(),
                AssemblyEvent::Progress { .. }
            ));
        }
        assert_eq!(assembler.received(), 45);

        let event = assembler.push(&[CONTROL_END]).unwrap();
        assert_eq!(
            event,
            AssemblyEvent::Completed(ReceivedFile {
                name: "doc.txt".to_string(),
                data
            })
        );
        assert!(assembler.is_idle());
    }

    #[test]
    fn test_data_bytes_matching_tags_are_data() {
        let mut assembler = FileAssembler::new();
        assembler.push(&start(3, "t")).unwrap();
        assembler.push(&[CONTROL_END]).unwrap();
        assembler.push(&[CONTROL_ERROR, 0x01]).unwrap();
        match assembler.push(&[CONTROL_END]).unwrap() {
            AssemblyEvent::Completed(file) => assert_eq!(file.data, vec![0x02, 0xFF, 0x01]),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_final_byte_ff_is_data() {
        let mut assembler = FileAssembler::new();
        assembler.push(&start(2, "t")).unwrap();
        assembler.push(&[0x10]).unwrap();
        assert_eq!(
            assembler.push(&[CONTROL_ERROR]).unwrap(),
            AssemblyEvent::Progress {
                received: 2,
                size: 2
            }
        );
    }

    #[test]
    fn test_error_frame_aborts() {
        let mut assembler = FileAssembler::new();
        assembler.push(&start(45, "doc.txt")).unwrap();
        assembler.push(&[0u8; 20]).unwrap();
        assert!(matches!(
            assembler.push(&[CONTROL_ERROR]).unwrap(),
            AssemblyEvent::Aborted(_)
        ));
        assert!(assembler.is_idle());
    }

    #[test]
    fn test_overflow_resets() {
        let mut assembler = FileAssembler::new();
        assembler.push(&start(5, "x")).unwrap();
        assert_eq!(
            assembler.push(&[0u8; 8]),
            Err(FrameError::Overflow { extra: 3 })
        );
        assert!(assembler.is_idle());
    }

    #[test]
    fn test_empty_file() {
        let mut assembler = FileAssembler::new();
        assembler.push(&start(0, "empty")).unwrap();
        assert!(matches!(
            assembler.push(&[CONTROL_END]).unwrap(),
            AssemblyEvent::Completed(ReceivedFile { ref data, .. }) if data.is_empty()
        ));
    }

    #[test]
    fn test_end_while_idle_is_rejected() {
        let mut assembler = FileAssembler::new();
        assert_eq!(
            assembler.push(&[CONTROL_END]),
            Err(FrameError::UnexpectedFrame {
                frame: "END",
                phase: "idle"
            })
        );
    }
}
