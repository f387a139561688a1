use super::*;

#[test]
fn test_frame_crc32_check_value() {
    assert_eq!(FRAME_CRC32.checksum(b"123456789"), 0xCBF4_3926);
}

#[test]
fn test_sentence_crc32_skips_inversions() {
    assert_eq!(SENTENCE_CRC32.checksum(b"123456789"), 0x2DFD_2D88);
}

#[test]
fn test_streaming_digest_matches_one_shot() {
    let data = b"\xAA\x44\x18\x14streaming digest";
    let mut digest = FRAME_CRC32.digest();
    for byte in data.iter() {
        digest.update(&[*byte]);
    }
    assert_eq!(digest.finalize(), FRAME_CRC32.checksum(data));
}

#[test]
fn test_rtcm_crc24_check_value() {
    assert_eq!(RTCM_CRC24.checksum(b"123456789"), 0x00CD_E703);
}

#[test]
fn test_rtcm_crc24_residue_is_zero() {
    // A frame with its trailing CRC appended hashes to zero.
    let body = [0xD3u8, 0x00, 0x02, 0x12, 0x34];
    let crc = RTCM_CRC24.checksum(&body);
    let mut frame = body.to_vec();
    frame.push((crc >> 16) as u8);
    frame.push((crc >> 8) as u8);
    frame.push(crc as u8);
    assert_eq!(RTCM_CRC24.checksum(&frame), 0);
}

#[test]
fn test_ascii_to_nibble() {
    assert_eq!(ascii_to_nibble(b'0'), Some(0));
    assert_eq!(ascii_to_nibble(b'9'), Some(9));
    assert_eq!(ascii_to_nibble(b'a'), Some(10));
    assert_eq!(ascii_to_nibble(b'F'), Some(15));
    assert_eq!(ascii_to_nibble(b'g'), None);
    assert_eq!(ascii_to_nibble(b'*'), None);
    assert_eq!(ascii_to_nibble(0x10), None);
}

#[test]
fn test_xor_checksum() {
    assert_eq!(xor_checksum(b""), 0);
    assert_eq!(
        xor_checksum(b"GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W"),
        0x6A
    );
}
