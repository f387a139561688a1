use std::sync::{Arc, Mutex};

use crate::parser::{MessageParser, ParserConfig, Protocol};

// 28 byte header, 4 byte payload, CRC32.
const UNICORE_FRAME: [u8; 36] = [
    0xAA, 0x44, 0x12, 0x1C, 0x37, 0x00, 0x01, 0x01, 0x04, 0x00, 0x00, 0x02, 0x98, 0x08, 0x00,
    0x70, 0x99, 0x14, 0x00, 0x00, 0x00, 0x00, 0x01, 0x12, 0x0A, 0x00, 0x00, 0x00, 0xDE, 0xAD,
    0xBE, 0xEF, 0x9E, 0x0D, 0x65, 0xC4,
];

type Messages = Arc<Mutex<Vec<(u16, Vec<u8>)>>>;

fn session(rescue: bool) -> (MessageParser, Messages, Arc<Mutex<u32>>) {
    let messages: Messages = Arc::new(Mutex::new(Vec::new()));
    let bad_count = Arc::new(Mutex::new(0u32));
    let sink = Arc::clone(&messages);
    let bad_sink = Arc::clone(&bad_count);
    let parser = MessageParser::new(ParserConfig {
        registry: vec![Protocol::UnicoreBinary],
        on_message: Some(Box::new(move |frame| {
            sink.lock()
                .unwrap()
                .push((frame.message_id().unwrap(), frame.payload().to_vec()));
        })),
        on_bad_crc: Some(Box::new(move |_| {
            *bad_sink.lock().unwrap() += 1;
            rescue
        })),
        ..Default::default()
    })
    .unwrap();
    (parser, messages, bad_count)
}

#[test]
fn test_good_frame() {
    let (mut parser, messages, bad_count) = session(false);
    parser.feed_buffer(&UNICORE_FRAME);

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, 257);
    assert_eq!(messages[0].1, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(*bad_count.lock().unwrap(), 0);
}

#[test]
fn test_bad_crc_consults_sink() {
    let mut corrupted = UNICORE_FRAME;
    corrupted[30] ^= 0x10;

    let (mut parser, messages, bad_count) = session(false);
    parser.feed_buffer(&corrupted);
    assert!(messages.lock().unwrap().is_empty());
    assert_eq!(*bad_count.lock().unwrap(), 1);

    let (mut parser, messages, bad_count) = session(true);
    parser.feed_buffer(&corrupted);
    assert_eq!(messages.lock().unwrap().len(), 1);
    assert_eq!(*bad_count.lock().unwrap(), 1);
}

#[test]
fn test_invalid_header_length_retreats() {
    let mut frame = UNICORE_FRAME;
    frame[3] = 0x14;

    let (mut parser, messages, bad_count) = session(false);
    parser.feed_buffer(&frame);
    assert!(messages.lock().unwrap().is_empty());
    assert_eq!(*bad_count.lock().unwrap(), 0, "framing error, not a CRC error");

    parser.feed_buffer(&UNICORE_FRAME);
    assert_eq!(messages.lock().unwrap().len(), 1);
}

#[test]
fn test_third_sync_mismatch_retreats() {
    let (mut parser, messages, _) = session(false);
    // A BT/SEMP frame start dies on the third sync byte here.
    parser.feed_buffer(&[0xAA, 0x44, 0x18]);
    parser.feed_buffer(&UNICORE_FRAME);
    assert_eq!(messages.lock().unwrap().len(), 1);
}
