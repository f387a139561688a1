
use std::fmt;

use bytes::{BufMut, BytesMut};
use crc::{Crc, Digest};

use crate::bt_semp;
use crate::error::{Error, Result};
use crate::frame::{Frame, FrameDetail};
use crate::nmea;
use crate::rtcm;
use crate::ublox;
use crate::unicore_binary;
use crate::unicore_hash;

/// Smallest working buffer a session accepts.
pub const MINIMUM_BUFFER_LENGTH: usize = 256;

/// Default working buffer size. The largest RTCM3 frame (3 header, 1023
/// payload, 3 CRC bytes) fits with room to spare.
pub const DEFAULT_BUFFER_LENGTH: usize = 3000;

/// End of message sink, called once per accepted frame.
pub type OnMessageFn = Box<dyn FnMut(&Frame<'_>) + Send + Sync>;

/// Integrity failure sink. Return `true` to rescue the frame: it is then
/// treated as valid and delivered to the end of message sink. Lets an upper
/// layer substitute its own checksum rules for non-conforming devices.
pub type OnBadCrcFn = Box<dyn FnMut(&Frame<'_>) -> bool + Send + Sync>;

/// Diagnostic text sink.
pub type OnLogFn = Box<dyn FnMut(&str) + Send + Sync>;

/// The framings a session can lock onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// OEM-style binary header protocol, sync `AA 44 18`.
    BtSemp,
    /// NMEA 0183 ASCII sentences, `$` or `!` through `*CC\r\n`.
    Nmea,
    /// u-blox UBX binary, sync `B5 62`.
    Ublox,
    /// RTCM 10403 version 3 correction frames, preamble `D3`.
    Rtcm3,
    /// Unicore binary, sync `AA 44 12`.
    UnicoreBinary,
    /// Unicore ASCII hash sentences, `#` through `*` plus 2 or 8 checksum
    /// digits.
    UnicoreHash,
}

impl Protocol {
    pub fn name(self) -> &'static str {
        match self {
            Protocol::BtSemp => "BT/SEMP",
            Protocol::Nmea => "NMEA",
            Protocol::Ublox => "UBX",
            Protocol::Rtcm3 => "RTCM3",
            Protocol::UnicoreBinary => "Unicore binary",
            Protocol::UnicoreHash => "Unicore hash",
        }
    }

    /// Offers `byte` as this protocol's preamble. Acceptance installs the
    /// protocol's state machine.
    fn begin(self, parser: &mut MessageParser, byte: u8) -> Option<Machine> {
        match self {
            Protocol::BtSemp => bt_semp::begin(parser, byte),
            Protocol::Nmea => nmea::begin(parser, byte),
            Protocol::Ublox => ublox::begin(parser, byte),
            Protocol::Rtcm3 => rtcm::begin(parser, byte),
            Protocol::UnicoreBinary => unicore_binary::begin(parser, byte),
            Protocol::UnicoreHash => unicore_hash::begin(parser, byte),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every supported protocol, in the canonical tie-break order.
///
/// Registry order is load-bearing: BT/SEMP and Unicore binary share the
/// first two sync bytes `AA 44`, so whichever is registered first claims an
/// `AA` and the other protocol's frames are lost to the third-byte
/// mismatch. Callers mixing both on one stream must choose deliberately.
pub const DEFAULT_REGISTRY: [Protocol; 6] = [
    Protocol::BtSemp,
    Protocol::Nmea,
    Protocol::Ublox,
    Protocol::Rtcm3,
    Protocol::UnicoreBinary,
    Protocol::UnicoreHash,
];

/// Per-protocol counters, reported in registry order by
/// [`MessageParser::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolStats {
    pub protocol: Protocol,
    pub messages_processed: u32,
    pub crc_errors: u32,
}

/// Session configuration. `on_message` and a non-empty registry are
/// required; everything else has a usable default.
pub struct ParserConfig {
    /// Label prepended to diagnostics, useful when several sessions share a
    /// log.
    pub parser_name: String,
    /// Protocols to scan for, in tie-break order.
    pub registry: Vec<Protocol>,
    /// Capacity of the working buffer, at least [`MINIMUM_BUFFER_LENGTH`].
    pub buffer_capacity: usize,
    pub on_message: Option<OnMessageFn>,
    pub on_bad_crc: Option<OnBadCrcFn>,
    pub on_debug: Option<OnLogFn>,
    pub on_error: Option<OnLogFn>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            parser_name: "gnss-framer".to_owned(),
            registry: DEFAULT_REGISTRY.to_vec(),
            buffer_capacity: DEFAULT_BUFFER_LENGTH,
            on_message: None,
            on_bad_crc: None,
            on_debug: None,
            on_error: None,
        }
    }
}

/// One byte's outcome inside a locked protocol machine.
pub(crate) enum Step {
    /// Keep collecting; the machine to apply to the next byte.
    Continue(Machine),
    /// The frame is over (delivered, rescued or discarded); the byte that
    /// ended it was consumed.
    Done,
    /// Framing gave up on this byte (sync mismatch, bad length, invalid
    /// checksum character) or an ASCII sentence ended without a line
    /// terminator. The partial frame is discarded and the byte is offered
    /// to every registered preamble again.
    Rescan,
}

/// The per-protocol state machines. Exactly one is live while a frame is in
/// progress; the variant is fixed by the registry entry that accepted the
/// preamble, so a machine can never observe another protocol's scratch.
pub(crate) enum Machine {
    BtSemp(bt_semp::BtSempMachine),
    Nmea(nmea::NmeaMachine),
    Ublox(ublox::UbloxMachine),
    Rtcm(rtcm::RtcmMachine),
    UnicoreBinary(unicore_binary::UnicoreBinaryMachine),
    UnicoreHash(unicore_hash::UnicoreHashMachine),
}

impl Machine {
    fn advance(self, parser: &mut MessageParser, index: usize, byte: u8) -> Step {
        match self {
            Machine::BtSemp(machine) => machine.advance(parser, index, byte),
            Machine::Nmea(machine) => machine.advance(parser, index, byte),
            Machine::Ublox(machine) => machine.advance(parser, index, byte),
            Machine::Rtcm(machine) => machine.advance(parser, index, byte),
            Machine::UnicoreBinary(machine) => machine.advance(parser, index, byte),
            Machine::UnicoreHash(machine) => machine.advance(parser, index, byte),
        }
    }
}

struct ActiveParser {
    /// Registry index of the protocol driving the machine.
    index: usize,
    machine: Machine,
}

/// A framing session over one byte stream.
///
/// The session owns its working buffer exclusively; [`feed_byte`] is the
/// only mutating entry point and is synchronous, so callers serving several
/// producers need one session per producer or an external lock.
///
/// [`feed_byte`]: MessageParser::feed_byte
pub struct MessageParser {
    name: String,
    registry: Vec<Protocol>,
    buffer: BytesMut,
    capacity: usize,
    /// `None` while scanning for a preamble.
    active: Option<ActiveParser>,
    /// Streaming integrity accumulator for protocols whose CRC the
    /// dispatcher computes (BT/SEMP, Unicore binary, RTCM3). The ASCII
    /// XOR-8 and UBX Fletcher sums live in the machines instead.
    crc: Option<Digest<'static, u32>>,
    on_message: OnMessageFn,
    on_bad_crc: Option<OnBadCrcFn>,
    on_debug: Option<OnLogFn>,
    on_error: Option<OnLogFn>,
    messages_processed: Vec<u32>,
    crc_errors: Vec<u32>,
    total_bytes: u64,
    protocol_switches: u32,
    last_protocol: Option<usize>,
}

impl MessageParser {
    pub fn new(config: ParserConfig) -> Result<Self> {
        if config.registry.is_empty() {
            return Err(Error::ErrEmptyRegistry);
        }
        if config.buffer_capacity < MINIMUM_BUFFER_LENGTH {
            return Err(Error::ErrBufferTooSmall(config.buffer_capacity));
        }
        let on_message = config.on_message.ok_or(Error::ErrMissingMessageHandler)?;

        let protocols = config.registry.len();
        Ok(MessageParser {
            name: config.parser_name,
            buffer: BytesMut::with_capacity(config.buffer_capacity),
            capacity: config.buffer_capacity,
            active: None,
            crc: None,
            on_message,
            on_bad_crc: config.on_bad_crc,
            on_debug: config.on_debug,
            on_error: config.on_error,
            messages_processed: vec![0; protocols],
            crc_errors: vec![0; protocols],
            total_bytes: 0,
            protocol_switches: 0,
            last_protocol: None,
            registry: config.registry,
        })
    }

    /// Consumes one byte from the stream.
    ///
    /// Total: every failure is recovered internally and surfaces only
    /// through the configured sinks. Fires the end of message sink at most
    /// once, after the frame's integrity check passed (or the bad CRC sink
    /// rescued it).
    pub fn feed_byte(&mut self, byte: u8) {
        self.total_bytes += 1;
        let active = match self.active.take() {
            Some(active) => active,
            None => {
                self.scan(byte);
                return;
            }
        };

        if self.buffer.len() >= self.capacity {
            let capacity = self.capacity;
            self.error(format_args!(
                "message too long, increase the buffer size > {}",
                capacity
            ));
            self.crc = None;
            self.scan(byte);
            return;
        }

        self.buffer.put_u8(byte);
        if let Some(digest) = self.crc.as_mut() {
            digest.update(&[byte]);
        }

        let index = active.index;
        match active.machine.advance(self, index, byte) {
            Step::Continue(machine) => {
                self.active = Some(ActiveParser { index, machine });
            }
            Step::Done => {
                self.crc = None;
            }
            Step::Rescan => {
                self.crc = None;
                self.scan(byte);
            }
        }
    }

    /// Consumes a whole buffer; equivalent to feeding every byte in order.
    pub fn feed_buffer(&mut self, data: &[u8]) {
        for byte in data.iter() {
            self.feed_byte(*byte);
        }
    }

    /// Abandons any in-progress frame and resumes preamble scanning.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.active = None;
        self.crc = None;
    }

    /// Registry index of the protocol currently locked on, or `None` while
    /// scanning.
    pub fn active_protocol(&self) -> Option<usize> {
        self.active.as_ref().map(|active| active.index)
    }

    /// The protocols this session scans for, in tie-break order.
    pub fn registry(&self) -> &[Protocol] {
        &self.registry
    }

    /// Per-protocol message and checksum-error counts, in registry order.
    pub fn stats(&self) -> Vec<ProtocolStats> {
        self.registry
            .iter()
            .enumerate()
            .map(|(index, &protocol)| ProtocolStats {
                protocol,
                messages_processed: self.messages_processed[index],
                crc_errors: self.crc_errors[index],
            })
            .collect()
    }

    /// Bytes consumed since creation (or the last [`reset_stats`]).
    ///
    /// [`reset_stats`]: MessageParser::reset_stats
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// How often a preamble was claimed by a different protocol than the
    /// previous one.
    pub fn protocol_switches(&self) -> u32 {
        self.protocol_switches
    }

    pub fn reset_stats(&mut self) {
        for count in self.messages_processed.iter_mut() {
            *count = 0;
        }
        for count in self.crc_errors.iter_mut() {
            *count = 0;
        }
        self.total_bytes = 0;
        self.protocol_switches = 0;
    }

    /// Restarts preamble scanning with `byte` as the candidate first byte.
    ///
    /// The byte is committed to the (now empty) buffer before the registry
    /// is consulted so that an accepting protocol finds it in place; if
    /// nobody accepts, the next scan discards it again, which makes
    /// scanning a single-byte sliding window.
    fn scan(&mut self, byte: u8) {
        self.buffer.clear();
        self.crc = None;
        self.buffer.put_u8(byte);
        for index in 0..self.registry.len() {
            let protocol = self.registry[index];
            if let Some(machine) = protocol.begin(self, byte) {
                if self.last_protocol != Some(index) {
                    if self.last_protocol.is_some() {
                        self.protocol_switches += 1;
                    }
                    self.last_protocol = Some(index);
                }
                self.active = Some(ActiveParser { index, machine });
                return;
            }
        }
    }

    //----------------------------------------
    // Services for the protocol machines
    //----------------------------------------

    /// Bytes committed to the in-progress frame.
    pub(crate) fn committed(&self) -> &[u8] {
        &self.buffer[..]
    }

    pub(crate) fn message_length(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes the byte just committed; the ASCII machines drop the line
    /// terminator from the sentence this way before normalizing it.
    pub(crate) fn truncate_last(&mut self) {
        let length = self.buffer.len().saturating_sub(1);
        self.buffer.truncate(length);
    }

    /// Appends the canonical `\r\n` sentence trailer. Callers have already
    /// reserved the headroom.
    pub(crate) fn push_crlf(&mut self) {
        self.buffer.put_u8(b'\r');
        self.buffer.put_u8(b'\n');
    }

    /// Starts the dispatcher-driven integrity accumulator on `kernel`,
    /// seeded with the preamble byte.
    pub(crate) fn start_crc(&mut self, kernel: &'static Crc<u32>, byte: u8) {
        let mut digest = kernel.digest();
        digest.update(&[byte]);
        self.crc = Some(digest);
    }

    /// Stops the streaming accumulator and returns the finalized value.
    pub(crate) fn finalize_crc(&mut self) -> u32 {
        self.crc.take().map(|digest| digest.finalize()).unwrap_or(0)
    }

    /// Reports an integrity mismatch and asks the bad CRC sink, when
    /// configured, whether to rescue the frame.
    pub(crate) fn consult_bad_crc(&mut self, index: usize, detail: FrameDetail) -> bool {
        self.crc_errors[index] += 1;
        if let Some(on_bad_crc) = self.on_bad_crc.as_mut() {
            let frame = Frame::new(&self.buffer[..], self.registry[index], index, detail);
            on_bad_crc(&frame)
        } else {
            false
        }
    }

    /// Delivers the completed frame to the end of message sink.
    pub(crate) fn deliver(&mut self, index: usize, detail: FrameDetail) {
        self.messages_processed[index] += 1;
        let frame = Frame::new(&self.buffer[..], self.registry[index], index, detail);
        (self.on_message)(&frame);
    }

    pub(crate) fn debug(&mut self, args: fmt::Arguments<'_>) {
        if let Some(sink) = self.on_debug.as_mut() {
            sink(&format!("{}: {}", self.name, args));
        } else {
            log::debug!("{}: {}", self.name, args);
        }
    }

    pub(crate) fn error(&mut self, args: fmt::Arguments<'_>) {
        if let Some(sink) = self.on_error.as_mut() {
            sink(&format!("{}: {}", self.name, args));
        } else {
            log::error!("{}: {}", self.name, args);
        }
    }
}
