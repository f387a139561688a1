
use crate::frame::FrameDetail;
use crate::parser::{Machine, MessageParser, Step};

// u-blox UBX frame format:
//
//  +-------+-------+-------+------+----------+---------+------+------+
//  | SYNC1 | SYNC2 | CLASS |  ID  |  LENGTH  | PAYLOAD | CK_A | CK_B |
//  | 0xB5  | 0x62  |       |      | little   | n bytes |      |      |
//  |       |       |       |      | endian   |         |      |      |
//  +-------+-------+-------+------+----------+---------+------+------+
//                  |                                    |
//                  |<-------- checksum range ---------->|
//
// The checksum is the two-accumulator Fletcher sum: starting from zero,
// ck_a += byte and ck_b += ck_a for every byte of CLASS..PAYLOAD, both
// modulo 256. The transmitted pair is the two accumulators in order.

pub(crate) const SYNC_1: u8 = 0xB5;
pub(crate) const SYNC_2: u8 = 0x62;

pub(crate) const HEADER_LENGTH: usize = 6;

pub(crate) fn begin(_parser: &mut MessageParser, byte: u8) -> Option<Machine> {
    if byte != SYNC_1 {
        return None;
    }
    Some(Machine::Ublox(UbloxMachine {
        state: State::Sync2,
        bytes_remaining: 0,
        message: 0,
        ck_a: 0,
        ck_b: 0,
    }))
}

#[derive(Debug)]
enum State {
    Sync2,
    Class,
    Id,
    LengthLow,
    LengthHigh,
    Payload,
    ChecksumA,
    ChecksumB,
}

#[derive(Debug)]
pub(crate) struct UbloxMachine {
    state: State,
    bytes_remaining: u16,
    /// CLASS << 8 | ID.
    message: u16,
    ck_a: u8,
    ck_b: u8,
}

impl UbloxMachine {
    fn accumulate(&mut self, byte: u8) {
        self.ck_a = self.ck_a.wrapping_add(byte);
        self.ck_b = self.ck_b.wrapping_add(self.ck_a);
    }

    pub(crate) fn advance(mut self, parser: &mut MessageParser, index: usize, byte: u8) -> Step {
        match self.state {
            State::Sync2 => {
                if byte != SYNC_2 {
                    parser.debug(format_args!("UBX invalid second sync byte 0x{:02x}", byte));
                    return Step::Rescan;
                }
                self.state = State::Class;
            }
            State::Class => {
                self.accumulate(byte);
                self.message = u16::from(byte) << 8;
                self.state = State::Id;
            }
            State::Id => {
                self.accumulate(byte);
                self.message |= u16::from(byte);
                self.state = State::LengthLow;
            }
            State::LengthLow => {
                self.accumulate(byte);
                self.bytes_remaining = u16::from(byte);
                self.state = State::LengthHigh;
            }
            State::LengthHigh => {
                self.accumulate(byte);
                self.bytes_remaining |= u16::from(byte) << 8;
                // Two checksum bytes still have to fit after the payload.
                let headroom = parser.capacity() - parser.message_length() - 2;
                if usize::from(self.bytes_remaining) > headroom {
                    parser.debug(format_args!(
                        "UBX message length {} exceeds the {} byte headroom",
                        self.bytes_remaining, headroom
                    ));
                    return Step::Rescan;
                }
                if self.bytes_remaining == 0 {
                    self.state = State::ChecksumA;
                } else {
                    self.state = State::Payload;
                }
            }
            State::Payload => {
                self.accumulate(byte);
                self.bytes_remaining -= 1;
                if self.bytes_remaining == 0 {
                    self.state = State::ChecksumA;
                }
            }
            State::ChecksumA => {
                // Collected; both bytes are judged together at CK_B.
                self.state = State::ChecksumB;
            }
            State::ChecksumB => {
                return self.validate(parser, index);
            }
        }
        Step::Continue(Machine::Ublox(self))
    }

    fn validate(self, parser: &mut MessageParser, index: usize) -> Step {
        let (received_a, received_b) = {
            let data = parser.committed();
            let length = data.len();
            (data[length - 2], data[length - 1])
        };
        let detail = FrameDetail::Ublox {
            message: self.message,
        };

        let checksum_ok = received_a == self.ck_a && received_b == self.ck_b;
        if checksum_ok || parser.consult_bad_crc(index, detail) {
            parser.deliver(index, detail);
        } else {
            parser.debug(format_args!(
                "UBX bad checksum, received 0x{:02x}{:02x} computed 0x{:02x}{:02x}",
                received_a, received_b, self.ck_a, self.ck_b
            ));
        }
        Step::Done
    }
}
