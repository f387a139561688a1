
use crate::checksum::{ascii_to_nibble, SENTENCE_CRC32};
use crate::frame::{FrameDetail, SentenceName};
use crate::parser::{Machine, MessageParser, Step};

// Unicore hash sentence:
//
//   #AGRICA,2,GPS,FINE,...*59e68624\r\n
//   #MODE,1,GPS*76\r\n
//
// Same shape as NMEA with one twist: the checksum width depends on the
// sentence name. Names containing "MODE" carry the two-digit XOR-8; every
// other sentence carries a CRC32 as eight hex digits, most significant
// first, computed with the uninverted kernel over the bytes between the
// `#` and the `*`, both exclusive.

/// Checksum digits on the XOR-8 path.
const XOR_CHECKSUM_BYTES: u8 = 2;
/// Checksum digits on the CRC32 path.
const CRC_CHECKSUM_BYTES: u8 = 8;

/// Room kept while hunting the asterisk, as NMEA reserves it; the CRC32
/// path re-checks before normalizing since its checksum runs longer.
const TRAILER_BYTES: usize = 5;

pub(crate) fn begin(_parser: &mut MessageParser, byte: u8) -> Option<Machine> {
    if byte != b'#' {
        return None;
    }
    Some(Machine::UnicoreHash(UnicoreHashMachine {
        state: State::FirstComma,
        sentence_name: SentenceName::new(),
        bytes_remaining: 0,
        checksum_bytes: 0,
        crc: 0,
    }))
}

#[derive(Debug)]
enum State {
    FirstComma,
    FindAsterisk,
    ChecksumBytes,
    LineTermination,
}

#[derive(Debug)]
pub(crate) struct UnicoreHashMachine {
    state: State,
    sentence_name: SentenceName,
    /// Checksum digits still to read.
    bytes_remaining: u8,
    /// Checksum width this sentence transmits, fixed at the first comma.
    checksum_bytes: u8,
    /// Running XOR-8; only judged on the two-digit path.
    crc: u8,
}

impl UnicoreHashMachine {
    pub(crate) fn advance(mut self, parser: &mut MessageParser, index: usize, byte: u8) -> Step {
        match self.state {
            State::FirstComma => {
                self.crc ^= byte;
                if byte != b',' || self.sentence_name.is_empty() {
                    let upper = byte & !0x20;
                    if !(b'A'..=b'Z').contains(&upper) && !byte.is_ascii_digit() {
                        parser.debug(format_args!(
                            "Unicore hash invalid sentence name character 0x{:02x}",
                            byte
                        ));
                        return Step::Rescan;
                    }
                    if !self.sentence_name.push(byte) {
                        parser.debug(format_args!("Unicore hash sentence name too long"));
                        return Step::Rescan;
                    }
                } else {
                    self.checksum_bytes = if self.sentence_name.contains(b"MODE") {
                        XOR_CHECKSUM_BYTES
                    } else {
                        CRC_CHECKSUM_BYTES
                    };
                    self.state = State::FindAsterisk;
                }
            }
            State::FindAsterisk => {
                if byte == b'*' {
                    self.bytes_remaining = self.checksum_bytes;
                    self.state = State::ChecksumBytes;
                } else {
                    self.crc ^= byte;
                    let capacity = parser.capacity();
                    if parser.message_length() + TRAILER_BYTES > capacity {
                        parser.debug(format_args!(
                            "Unicore hash sentence too long, increase the buffer size > {}",
                            capacity
                        ));
                        return Step::Rescan;
                    }
                }
            }
            State::ChecksumBytes => {
                self.bytes_remaining -= 1;
                if ascii_to_nibble(byte).is_none() {
                    parser.debug(format_args!("Unicore hash invalid checksum character"));
                    return Step::Rescan;
                }
                if self.bytes_remaining == 0 {
                    self.state = State::LineTermination;
                }
            }
            State::LineTermination => {
                parser.truncate_last();
                self.validate(parser, index);
                if byte == b'\r' || byte == b'\n' {
                    return Step::Done;
                }
                return Step::Rescan;
            }
        }
        Step::Continue(Machine::UnicoreHash(self))
    }

    fn validate(&self, parser: &mut MessageParser, index: usize) {
        if self.checksum_bytes == XOR_CHECKSUM_BYTES {
            self.validate_xor(parser, index);
        } else {
            self.validate_crc(parser, index);
        }
    }

    fn validate_xor(&self, parser: &mut MessageParser, index: usize) {
        let received = {
            let data = parser.committed();
            let length = data.len();
            let high = ascii_to_nibble(data[length - 2]).unwrap_or(0);
            let low = ascii_to_nibble(data[length - 1]).unwrap_or(0);
            (high << 4) | low
        };
        let detail = FrameDetail::UnicoreHash {
            sentence_name: self.sentence_name,
        };

        if received == self.crc || parser.consult_bad_crc(index, detail) {
            parser.push_crlf();
            parser.deliver(index, detail);
        } else {
            parser.debug(format_args!(
                "Unicore hash {} bad checksum, received 0x{:02x} computed 0x{:02x}",
                self.sentence_name, received, self.crc
            ));
        }
    }

    fn validate_crc(&self, parser: &mut MessageParser, index: usize) {
        let (received, computed) = {
            let data = parser.committed();
            let length = data.len();
            // `*` sits before the eight checksum digits.
            let asterisk = length - 1 - usize::from(CRC_CHECKSUM_BYTES);
            let computed = SENTENCE_CRC32.checksum(&data[1..asterisk]);
            let received = data[length - usize::from(CRC_CHECKSUM_BYTES)..length]
                .iter()
                .fold(0u32, |value, &digit| {
                    (value << 4) | u32::from(ascii_to_nibble(digit).unwrap_or(0))
                });
            (received, computed)
        };
        let detail = FrameDetail::UnicoreHash {
            sentence_name: self.sentence_name,
        };

        if received == computed || parser.consult_bad_crc(index, detail) {
            let capacity = parser.capacity();
            if parser.message_length() + 2 > capacity {
                parser.error(format_args!(
                    "Unicore hash sentence too long, increase the buffer size > {}",
                    capacity
                ));
                return;
            }
            parser.push_crlf();
            parser.deliver(index, detail);
        } else {
            parser.debug(format_args!(
                "Unicore hash {} bad CRC, received 0x{:08x} computed 0x{:08x}",
                self.sentence_name, received, computed
            ));
        }
    }
}
