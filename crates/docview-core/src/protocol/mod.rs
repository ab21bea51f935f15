//! Docview Protocol Module
//!
//! Wire-level pieces of the file transfer:
//! - `frame`: START/END/ERROR control frames and packet sizing
//! - `assembly`: receiver-side reassembly of the packet stream
//! - `transfer_state`: transfer lifecycle state machine

pub mod assembly;
pub mod frame;
pub mod transfer_state;

// Re-export frame types
pub use frame::{
    check_packet_size, encode_start, max_start_name_len, total_chunks, ControlFrame, Packet,
    CONTROL_END, CONTROL_ERROR, CONTROL_START, DEFAULT_MAX_PACKET_SIZE, START_HEADER_LEN,
};

// Re-export assembly types
pub use assembly::{AssemblyEvent, FileAssembler, ReceivedFile};

// Re-export state machine types
pub use transfer_state::{StateTransitionError, TransferEvent, TransferStatus};
