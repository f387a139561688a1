#[cfg(test)]
mod checksum_test;

use crc::{Algorithm, Crc, CRC_24_LTE_A, CRC_32_ISO_HDLC};

/// Reflected CRC32 (poly 0xEDB88320, init and final XOR 0xFFFFFFFF).
///
/// BT/SEMP and Unicore binary frames carry this CRC little-endian after the
/// payload.
pub(crate) static FRAME_CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// CRC24Q, the 24-bit Qualcomm CRC transmitted by RTCM3 (poly 0x1864CFB,
/// init 0). The catalog entry `CRC_24_LTE_A` is the same algorithm.
///
/// CRC24Q is self-synchronizing: running it over an intact frame including
/// the three trailing CRC bytes leaves zero.
pub(crate) static RTCM_CRC24: Crc<u32> = Crc::<u32>::new(&CRC_24_LTE_A);

/// The CRC32 variant Unicore hash (`#`) sentences transmit as 8 hex digits:
/// the reflected kernel of [`FRAME_CRC32`] with the init and final
/// inversions skipped.
const UNINVERTED_CRC32: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x04c1_1db7,
    init: 0x0000_0000,
    refin: true,
    refout: true,
    xorout: 0x0000_0000,
    check: 0x2dfd_2d88,
    residue: 0x0000_0000,
};

pub(crate) static SENTENCE_CRC32: Crc<u32> = Crc::<u32>::new(&UNINVERTED_CRC32);

/// Decodes an ASCII hex digit of either case.
pub(crate) fn ascii_to_nibble(data: u8) -> Option<u8> {
    match data {
        b'0'..=b'9' => Some(data - b'0'),
        b'a'..=b'f' => Some(data - b'a' + 10),
        b'A'..=b'F' => Some(data - b'A' + 10),
        _ => None,
    }
}

/// Byte-wise XOR over `data`, the checksum NMEA 0183 and Unicore `MODE`
/// sentences carry as two hex digits.
pub(crate) fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |checksum, byte| checksum ^ byte)
}
