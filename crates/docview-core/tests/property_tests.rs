//! Property-based tests for framing and chunking
//!
//! These verify the wire invariants for arbitrary sizes and names: the START
//! frame always carries the exact file size, and a successful send emits
//! exactly `ceil(n / packet size)` data packets between START and END.

use std::io::Cursor;

use docview_core::protocol::{
    encode_start, total_chunks, AssemblyEvent, ControlFrame, FileAssembler, CONTROL_END,
};
use docview_core::{CancelFlag, ChunkedSender, TransferConfig};
use proptest::prelude::*;

use test_utils::MockTransport;

/// File names including multi-byte characters
fn arb_file_name() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-zA-Z0-9_.é日本 -]{0,80}").unwrap()
}

proptest! {
    /// Property: START bytes 1..5 decode to the declared size
    #[test]
    fn start_frame_carries_exact_size(size in any::<u32>(), name in arb_file_name(), mps in 6usize..64) {
        let packet = encode_start(size, &name, mps).unwrap();
        prop_assert!(packet.len() <= mps);
        prop_assert_eq!(u32::from_be_bytes([packet[1], packet[2], packet[3], packet[4]]), size);
        prop_assert_eq!(*packet.last().unwrap(), 0);

        match ControlFrame::decode(&packet).unwrap() {
            ControlFrame::Start { file_size, file_name } => {
                prop_assert_eq!(file_size, size);
                prop_assert!(name.starts_with(&file_name));
            }
            other => prop_assert!(false, "decoded {:?}", other),
        }
    }

    /// Property: data packet count is ceil(n / mps), with only the last one short
    #[test]
    fn send_emits_expected_packets(len in 0usize..2048, mps in 6u16..64) {
        let transport = MockTransport::new(mps);
        let mps = mps as usize;
        let data: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();

        let config = TransferConfig::immediate();
        let cancel = CancelFlag::new();
        let sender = ChunkedSender::new(&transport, &config, &cancel);
        let summary = sender
            .send_file(&mut Cursor::new(data.clone()), len as u32, "p.bin", &mut ())
            .unwrap();

        let sent = transport.sent();
        let chunks = total_chunks(len as u64, mps);
        prop_assert_eq!(summary.chunks_sent, chunks);
        prop_assert_eq!(summary.bytes_sent, len as u64);
        prop_assert_eq!(sent.len(), chunks as usize + 2);
        prop_assert_eq!(sent.last().unwrap(), &vec![CONTROL_END]);

        let body = &sent[1..sent.len() - 1];
        if let Some((last, rest)) = body.split_last() {
            prop_assert!(rest.iter().all(|p| p.len() == mps));
            prop_assert!(!last.is_empty() && last.len() <= mps);
        }
        prop_assert_eq!(body.concat(), data);
    }

    /// Property: the assembler rebuilds whatever the sender streamed
    #[test]
    fn assembler_recovers_sent_file(data in prop::collection::vec(any::<u8>(), 0..600)) {
        let transport = MockTransport::new(20);
        let config = TransferConfig::immediate();
        let cancel = CancelFlag::new();
        let sender = ChunkedSender::new(&transport, &config, &cancel);
        sender
            .send_file(&mut Cursor::new(data.clone()), data.len() as u32, "a.bin", &mut ())
            .unwrap();

        let mut assembler = FileAssembler::new();
        let mut completed = None;
        for packet in transport.sent() {
            if let AssemblyEvent::Completed(file) = assembler.push(&packet).unwrap() {
                completed = Some(file);
            }
        }
        let file = completed.expect("file completed");
        prop_assert_eq!(file.name, "a.bin");
        prop_assert_eq!(file.data, data);
    }
}

#[test]
fn test_total_chunks_boundaries() {
    assert_eq!(total_chunks(0, 20), 0);
    assert_eq!(total_chunks(1, 20), 1);
    assert_eq!(total_chunks(20, 20), 1);
    assert_eq!(total_chunks(21, 20), 2);
    assert_eq!(total_chunks(45, 20), 3);
    assert_eq!(total_chunks(u64::from(u32::MAX), 20), 214_748_365);
}
