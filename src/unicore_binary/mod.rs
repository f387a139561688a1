#[cfg(test)]
mod unicore_binary_test;

use crate::checksum::FRAME_CRC32;
use crate::frame::FrameDetail;
use crate::parser::{Machine, MessageParser, Step};

// Unicore binary frame format, same shape as BT/SEMP with a longer header:
//
//  |<---------- 28 bytes ---------->|<---- data ---->|<- 4 bytes ->|
//  +----------+--------+------------+----------------+-------------+
//  | Preamble | HdrLen | Header     | Message data   |   CRC-32    |
//  | AA 44 12 |  0x1C  |            |    n bytes     | little end. |
//  +----------+--------+------------+----------------+-------------+
//
// Header layout, little-endian:
//   sync[3] | header_len(1) | cpu_idle(1) | reserved(1) | message_id(2) |
//   message_length(2) | reference_time(1) | time_status(1) |
//   week_number(2) | seconds_of_week(4) | reserved(4) |
//   released_version(1) | leap_seconds(1) | output_delay_ms(2) | reserved(2)

pub(crate) const SYNC_1: u8 = 0xAA;
pub(crate) const SYNC_2: u8 = 0x44;
pub(crate) const SYNC_3: u8 = 0x12;

pub(crate) const HEADER_LENGTH: usize = 28;
const CRC_LENGTH: u16 = 4;

const HEADER_LENGTH_BYTE: u8 = 0x1C;

const MESSAGE_ID_OFFSET: usize = 6;
const MESSAGE_LENGTH_OFFSET: usize = 8;

pub(crate) fn begin(parser: &mut MessageParser, byte: u8) -> Option<Machine> {
    if byte != SYNC_1 {
        return None;
    }
    parser.start_crc(&FRAME_CRC32, byte);
    Some(Machine::UnicoreBinary(UnicoreBinaryMachine {
        state: State::Sync2,
        bytes_remaining: 0,
        crc: 0,
    }))
}

#[derive(Debug)]
enum State {
    Sync2,
    Sync3,
    Header,
    Payload,
    Crc,
}

#[derive(Debug)]
pub(crate) struct UnicoreBinaryMachine {
    state: State,
    bytes_remaining: u16,
    crc: u32,
}

impl UnicoreBinaryMachine {
    pub(crate) fn advance(mut self, parser: &mut MessageParser, index: usize, byte: u8) -> Step {
        match self.state {
            State::Sync2 => {
                if byte != SYNC_2 {
                    parser.debug(format_args!(
                        "Unicore binary invalid second sync byte 0x{:02x}",
                        byte
                    ));
                    return Step::Rescan;
                }
                self.state = State::Sync3;
            }
            State::Sync3 => {
                if byte != SYNC_3 {
                    parser.debug(format_args!(
                        "Unicore binary invalid third sync byte 0x{:02x}",
                        byte
                    ));
                    return Step::Rescan;
                }
                self.state = State::Header;
            }
            State::Header => {
                if parser.message_length() < HEADER_LENGTH {
                    return Step::Continue(Machine::UnicoreBinary(self));
                }
                let header_len = parser.committed()[3];
                if header_len != HEADER_LENGTH_BYTE {
                    parser.debug(format_args!(
                        "Unicore binary invalid header length 0x{:02x}",
                        header_len
                    ));
                    return Step::Rescan;
                }
                self.bytes_remaining = {
                    let header = parser.committed();
                    u16::from_le_bytes([
                        header[MESSAGE_LENGTH_OFFSET],
                        header[MESSAGE_LENGTH_OFFSET + 1],
                    ])
                };
                if self.bytes_remaining == 0 {
                    self.finish_payload(parser);
                } else {
                    self.state = State::Payload;
                }
            }
            State::Payload => {
                self.bytes_remaining -= 1;
                if self.bytes_remaining == 0 {
                    self.finish_payload(parser);
                }
            }
            State::Crc => {
                self.bytes_remaining -= 1;
                if self.bytes_remaining == 0 {
                    return self.validate(parser, index);
                }
            }
        }
        Step::Continue(Machine::UnicoreBinary(self))
    }

    fn finish_payload(&mut self, parser: &mut MessageParser) {
        self.crc = parser.finalize_crc();
        self.bytes_remaining = CRC_LENGTH;
        self.state = State::Crc;
    }

    fn validate(self, parser: &mut MessageParser, index: usize) -> Step {
        let (received, detail) = {
            let data = parser.committed();
            let length = data.len();
            let received = u32::from_le_bytes([
                data[length - 4],
                data[length - 3],
                data[length - 2],
                data[length - 1],
            ]);
            let detail = FrameDetail::UnicoreBinary {
                message_id: u16::from_le_bytes([
                    data[MESSAGE_ID_OFFSET],
                    data[MESSAGE_ID_OFFSET + 1],
                ]),
            };
            (received, detail)
        };

        if received == self.crc || parser.consult_bad_crc(index, detail) {
            parser.deliver(index, detail);
        } else {
            parser.debug(format_args!(
                "Unicore binary bad CRC, received 0x{:08x} computed 0x{:08x}",
                received, self.crc
            ));
        }
        Step::Done
    }
}
