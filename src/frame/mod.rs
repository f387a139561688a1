
use std::fmt;
use std::str;

use crate::parser::Protocol;

/// Storage reserved for a captured sentence name, terminator included.
pub(crate) const SENTENCE_NAME_BYTES: usize = 16;

/// The name of an NMEA or Unicore hash sentence ("GPRMC", "AGRICA", ...),
/// captured between the preamble character and the first comma. At most 15
/// ASCII alphanumeric characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SentenceName {
    bytes: [u8; SENTENCE_NAME_BYTES],
    length: u8,
}

impl SentenceName {
    pub(crate) fn new() -> Self {
        SentenceName::default()
    }

    /// Appends a character, refusing once the name is full.
    pub(crate) fn push(&mut self, byte: u8) -> bool {
        if (self.length as usize) < SENTENCE_NAME_BYTES - 1 {
            self.bytes[self.length as usize] = byte;
            self.length += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub(crate) fn contains(&self, needle: &[u8]) -> bool {
        self.as_bytes().windows(needle.len()).any(|window| window == needle)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.length as usize]
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII alphanumerics are ever pushed.
        str::from_utf8(self.as_bytes()).unwrap_or("")
    }
}

impl fmt::Display for SentenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata the framing layer reads while locking onto a frame, copied out
/// of the per-protocol scratch when the frame completes.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FrameDetail {
    BtSemp { message_id: u16, message_type: u8 },
    Nmea { sentence_name: SentenceName },
    Ublox { message: u16 },
    Rtcm { message_number: u16 },
    UnicoreBinary { message_id: u16 },
    UnicoreHash { sentence_name: SentenceName },
}

/// A completed frame, borrowed from the session buffer.
///
/// Handed to the end of message and bad CRC sinks; the view must not outlive
/// the callback. ASCII sentences are delivered in canonical printable form:
/// the preamble character and the literal checksum digits are kept and the
/// line ends with `\r\n` regardless of how the wire terminated it.
#[derive(Debug)]
pub struct Frame<'a> {
    data: &'a [u8],
    protocol: Protocol,
    index: usize,
    detail: FrameDetail,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(data: &'a [u8], protocol: Protocol, index: usize, detail: FrameDetail) -> Self {
        Frame {
            data,
            protocol,
            index,
            detail,
        }
    }

    /// The complete frame, preamble through trailer.
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The protocol that framed this message.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Index of the protocol in the session registry.
    pub fn protocol_index(&self) -> usize {
        self.index
    }

    pub fn protocol_name(&self) -> &'static str {
        self.protocol.name()
    }

    /// The fixed-layout leader of the frame: the binary header for binary
    /// protocols, the preamble character for ASCII sentences.
    pub fn header(&self) -> &'a [u8] {
        let length = match self.detail {
            FrameDetail::BtSemp { .. } => crate::bt_semp::HEADER_LENGTH,
            FrameDetail::UnicoreBinary { .. } => crate::unicore_binary::HEADER_LENGTH,
            FrameDetail::Ublox { .. } => crate::ublox::HEADER_LENGTH,
            FrameDetail::Rtcm { .. } => crate::rtcm::HEADER_LENGTH,
            FrameDetail::Nmea { .. } | FrameDetail::UnicoreHash { .. } => 1,
        };
        &self.data[..length.min(self.data.len())]
    }

    /// The payload between the header and the integrity trailer. For ASCII
    /// sentences this is everything between the preamble character and the
    /// `*` that introduces the checksum.
    pub fn payload(&self) -> &'a [u8] {
        let (header, trailer) = match self.detail {
            FrameDetail::BtSemp { .. } => (crate::bt_semp::HEADER_LENGTH, 4),
            FrameDetail::UnicoreBinary { .. } => (crate::unicore_binary::HEADER_LENGTH, 4),
            FrameDetail::Ublox { .. } => (crate::ublox::HEADER_LENGTH, 2),
            FrameDetail::Rtcm { .. } => (crate::rtcm::HEADER_LENGTH, 3),
            FrameDetail::Nmea { .. } | FrameDetail::UnicoreHash { .. } => {
                let asterisk = self.data.iter().rposition(|&byte| byte == b'*');
                return match asterisk {
                    Some(position) if position > 0 => &self.data[1..position],
                    _ => &[],
                };
            }
        };
        if self.data.len() >= header + trailer {
            &self.data[header..self.data.len() - trailer]
        } else {
            &[]
        }
    }

    /// The sentence name of an NMEA or Unicore hash frame.
    pub fn sentence_name(&self) -> Option<&str> {
        match &self.detail {
            FrameDetail::Nmea { sentence_name } | FrameDetail::UnicoreHash { sentence_name } => {
                Some(sentence_name.as_str())
            }
            _ => None,
        }
    }

    /// The CLASS byte of a UBX frame.
    pub fn ublox_class(&self) -> Option<u8> {
        match self.detail {
            FrameDetail::Ublox { message } => Some((message >> 8) as u8),
            _ => None,
        }
    }

    /// The ID byte of a UBX frame.
    pub fn ublox_id(&self) -> Option<u8> {
        match self.detail {
            FrameDetail::Ublox { message } => Some(message as u8),
            _ => None,
        }
    }

    /// The 12-bit message number of an RTCM3 frame.
    pub fn message_number(&self) -> Option<u16> {
        match self.detail {
            FrameDetail::Rtcm { message_number } => Some(message_number),
            _ => None,
        }
    }

    /// The header message id of a BT/SEMP or Unicore binary frame.
    pub fn message_id(&self) -> Option<u16> {
        match self.detail {
            FrameDetail::BtSemp { message_id, .. }
            | FrameDetail::UnicoreBinary { message_id } => Some(message_id),
            _ => None,
        }
    }

    /// The message type byte of a BT/SEMP frame.
    pub fn message_type(&self) -> Option<u8> {
        match self.detail {
            FrameDetail::BtSemp { message_type, .. } => Some(message_type),
            _ => None,
        }
    }
}
