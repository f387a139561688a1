use std::sync::{Arc, Mutex};

use crate::parser::{MessageParser, ParserConfig, Protocol, MINIMUM_BUFFER_LENGTH};

const RMC_SENTENCE: &[u8] =
    b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";
const GSA_SENTENCE: &[u8] = b"$GNGSA,A,3,80,71,73,79,69,,,,,,,,1.83,1.09,1.47*17\r\n";
const AIS_SENTENCE: &[u8] = b"!AIVDM,1,1,,B,177KQJ5000G?tO`K>RA1wUbN0TKH,0*5C\r\n";

type Sentences = Arc<Mutex<Vec<(String, Vec<u8>)>>>;

fn session(rescue: bool, capacity: usize) -> (MessageParser, Sentences, Arc<Mutex<u32>>) {
    let sentences: Sentences = Arc::new(Mutex::new(Vec::new()));
    let bad_count = Arc::new(Mutex::new(0u32));
    let sink = Arc::clone(&sentences);
    let bad_sink = Arc::clone(&bad_count);
    let parser = MessageParser::new(ParserConfig {
        registry: vec![Protocol::Nmea],
        buffer_capacity: capacity,
        on_message: Some(Box::new(move |frame| {
            sink.lock().unwrap().push((
                frame.sentence_name().unwrap_or("").to_owned(),
                frame.bytes().to_vec(),
            ));
        })),
        on_bad_crc: Some(Box::new(move |_| {
            *bad_sink.lock().unwrap() += 1;
            rescue
        })),
        ..Default::default()
    })
    .unwrap();
    (parser, sentences, bad_count)
}

#[test]
fn test_good_rmc_sentence() {
    let (mut parser, sentences, bad_count) = session(false, 3000);
    parser.feed_buffer(RMC_SENTENCE);

    let sentences = sentences.lock().unwrap();
    assert_eq!(sentences.len(), 1);
    assert_eq!(sentences[0].0, "GPRMC");
    assert_eq!(sentences[0].1, RMC_SENTENCE);
    assert_eq!(*bad_count.lock().unwrap(), 0);
}

#[test]
fn test_exclamation_preamble() {
    let (mut parser, sentences, _) = session(false, 3000);
    parser.feed_buffer(AIS_SENTENCE);

    let sentences = sentences.lock().unwrap();
    assert_eq!(sentences.len(), 1);
    assert_eq!(sentences[0].0, "AIVDM");
}

#[test]
fn test_bad_checksum_consults_sink() {
    let mut corrupted = RMC_SENTENCE.to_vec();
    let length = corrupted.len();
    corrupted[length - 4] = b'F';
    corrupted[length - 3] = b'F';

    let (mut parser, sentences, bad_count) = session(false, 3000);
    parser.feed_buffer(&corrupted);
    assert!(sentences.lock().unwrap().is_empty());
    assert_eq!(*bad_count.lock().unwrap(), 1);

    let (mut parser, sentences, bad_count) = session(true, 3000);
    parser.feed_buffer(&corrupted);
    assert_eq!(sentences.lock().unwrap().len(), 1);
    assert_eq!(*bad_count.lock().unwrap(), 1);
}

#[test]
fn test_linefeed_only_termination_is_normalized() {
    let mut sentence = GSA_SENTENCE.to_vec();
    sentence.truncate(sentence.len() - 2);
    sentence.push(b'\n');

    let (mut parser, sentences, _) = session(false, 3000);
    parser.feed_buffer(&sentence);

    let sentences = sentences.lock().unwrap();
    assert_eq!(sentences.len(), 1);
    assert_eq!(
        sentences[0].1, GSA_SENTENCE,
        "delivered sentence always ends with CR LF"
    );
}

#[test]
fn test_missing_terminator_reoffers_next_preamble() {
    // The first sentence runs straight into the next one's `$`; both must
    // come through, the first normalized.
    let mut stream = GSA_SENTENCE[..GSA_SENTENCE.len() - 2].to_vec();
    stream.extend_from_slice(RMC_SENTENCE);

    let (mut parser, sentences, _) = session(false, 3000);
    parser.feed_buffer(&stream);

    let sentences = sentences.lock().unwrap();
    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[0].0, "GNGSA");
    assert_eq!(sentences[0].1, GSA_SENTENCE);
    assert_eq!(sentences[1].0, "GPRMC");
}

#[test]
fn test_invalid_name_character_retreats() {
    let (mut parser, sentences, bad_count) = session(false, 3000);
    parser.feed_buffer(b"$GP@RMC,whatever*00\r\n");
    parser.feed_buffer(RMC_SENTENCE);

    assert_eq!(sentences.lock().unwrap().len(), 1);
    assert_eq!(*bad_count.lock().unwrap(), 0);
}

#[test]
fn test_sentence_name_too_long_retreats() {
    let (mut parser, sentences, _) = session(false, 3000);
    parser.feed_buffer(b"$ABCDEFGHIJKLMNOPQ,1*00\r\n");
    parser.feed_buffer(RMC_SENTENCE);

    let sentences = sentences.lock().unwrap();
    assert_eq!(sentences.len(), 1);
    assert_eq!(sentences[0].0, "GPRMC");
}

#[test]
fn test_invalid_checksum_character_retreats() {
    let mut corrupted = RMC_SENTENCE.to_vec();
    let length = corrupted.len();
    corrupted[length - 3] = b'G';

    let (mut parser, sentences, bad_count) = session(false, 3000);
    parser.feed_buffer(&corrupted);
    parser.feed_buffer(RMC_SENTENCE);

    assert_eq!(sentences.lock().unwrap().len(), 1);
    assert_eq!(*bad_count.lock().unwrap(), 0, "framing error, not a checksum error");
}

#[test]
fn test_sentence_longer_than_buffer_recovers() {
    let (mut parser, sentences, _) = session(false, MINIMUM_BUFFER_LENGTH);
    let mut runaway = b"$GPTXT,".to_vec();
    runaway.extend_from_slice(&[b'A'; 400]);
    parser.feed_buffer(&runaway);
    assert!(sentences.lock().unwrap().is_empty());

    parser.feed_buffer(RMC_SENTENCE);
    assert_eq!(sentences.lock().unwrap().len(), 1);
}
