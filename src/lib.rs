//! Streaming multi-protocol message framer for GNSS and telemetry traffic
//!
//! Serial and radio links frequently interleave several framings on a single
//! byte stream: an OEM-style binary header protocol ("BT/SEMP", sync
//! `AA 44 18`), NMEA 0183 ASCII sentences, u-blox UBX binary, RTCM3
//! correction frames, a Unicore binary variant and the Unicore ASCII hash
//! sentences. This crate consumes such a stream one byte at a time,
//! identifies the next valid frame, verifies its integrity (reflected CRC32,
//! XOR-8, Fletcher-8, CRC24Q or an uninverted CRC32 depending on the
//! protocol) and hands the complete frame to a caller-supplied end of
//! message sink.
//!
//! The parser is a plain synchronous state machine. It never blocks, never
//! allocates on the hot path, resynchronizes after arbitrary noise and never
//! deadlocks on a truncated frame. Payload semantics (NAV-PVT geodesy, GGA
//! field extraction, RTCM message catalogs) are left to the caller; the
//! frame view passed to the sink exposes the raw bytes plus the few fields
//! the framing layer had to read anyway.

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

mod bt_semp;
mod checksum;
mod error;
mod frame;
mod nmea;
pub mod parser;
mod rtcm;
mod ublox;
mod unicore_binary;
mod unicore_hash;

pub use error::Error;
pub use frame::{Frame, SentenceName};
pub use parser::{
    MessageParser, OnBadCrcFn, OnLogFn, OnMessageFn, ParserConfig, Protocol, ProtocolStats,
    DEFAULT_BUFFER_LENGTH, DEFAULT_REGISTRY, MINIMUM_BUFFER_LENGTH,
};

/// Returns the library version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
