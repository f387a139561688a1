
use crate::checksum::FRAME_CRC32;
use crate::frame::FrameDetail;
use crate::parser::{Machine, MessageParser, Step};

// BT/SEMP frame format:
//
//  |<---------- 20 bytes ---------->|<---- data ---->|<- 4 bytes ->|
//  +----------+--------+------------+----------------+-------------+
//  | Preamble | HdrLen | Header     | Message data   |   CRC-32    |
//  | AA 44 18 |  0x14  | id, type.. |    n bytes     | little end. |
//  +----------+--------+------------+----------------+-------------+
//  |                                                 |
//  |<-------------------- CRC ---------------------->|
//
// Header layout, little-endian, packed:
//   sync[3] | header_len(1) | message_id(2) | reserved(2) | time(4) |
//   message_length(2) | reserved(2) | sender(1) | message_type(1) |
//   protocol(1) | msg_interval(1)

pub(crate) const SYNC_1: u8 = 0xAA;
pub(crate) const SYNC_2: u8 = 0x44;
pub(crate) const SYNC_3: u8 = 0x18;

pub(crate) const HEADER_LENGTH: usize = 20;
const CRC_LENGTH: u16 = 4;

/// Value the header_len field must carry.
const HEADER_LENGTH_BYTE: u8 = 0x14;

const MESSAGE_ID_OFFSET: usize = 4;
const MESSAGE_LENGTH_OFFSET: usize = 12;
const MESSAGE_TYPE_OFFSET: usize = 17;

pub(crate) fn begin(parser: &mut MessageParser, byte: u8) -> Option<Machine> {
    if byte != SYNC_1 {
        return None;
    }
    parser.start_crc(&FRAME_CRC32, byte);
    Some(Machine::BtSemp(BtSempMachine {
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
pub(crate) struct BtSempMachine {
    state: State,
    bytes_remaining: u16,
    /// Finalized CRC over sync..payload, snapshotted when the payload ends.
    crc: u32,
}

impl BtSempMachine {
    pub(crate) fn advance(mut self, parser: &mut MessageParser, index: usize, byte: u8) -> Step {
        match self.state {
            State::Sync2 => {
                if byte != SYNC_2 {
                    parser.debug(format_args!(
                        "BT/SEMP invalid second sync byte 0x{:02x}",
                        byte
                    ));
                    return Step::Rescan;
                }
                self.state = State::Sync3;
            }
            State::Sync3 => {
                if byte != SYNC_3 {
                    parser.debug(format_args!(
                        "BT/SEMP invalid third sync byte 0x{:02x}",
                        byte
                    ));
                    return Step::Rescan;
                }
                self.state = State::Header;
            }
            State::Header => {
                if parser.message_length() < HEADER_LENGTH {
                    return Step::Continue(Machine::BtSemp(self));
                }
                let header_len = parser.committed()[3];
                if header_len != HEADER_LENGTH_BYTE {
                    parser.debug(format_args!(
                        "BT/SEMP invalid header length 0x{:02x}",
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
        Step::Continue(Machine::BtSemp(self))
    }

    /// Payload complete: stop the streaming CRC and collect the 4 trailing
    /// bytes.
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
            let detail = FrameDetail::BtSemp {
                message_id: u16::from_le_bytes([
                    data[MESSAGE_ID_OFFSET],
                    data[MESSAGE_ID_OFFSET + 1],
                ]),
                message_type: data[MESSAGE_TYPE_OFFSET],
            };
            (received, detail)
        };

        if received == self.crc || parser.consult_bad_crc(index, detail) {
            parser.deliver(index, detail);
        } else {
            parser.debug(format_args!(
                "BT/SEMP bad CRC, received 0x{:08x} computed 0x{:08x}",
                received, self.crc
            ));
        }
        Step::Done
    }
}
