//! Tests for CRC module

use super::*;

#[test]
fn test_crc16_check_value() {
    assert_eq!(CRC16.checksum(b"123456789"), 0x31C3);
}

#[test]
fn test_crc32c_check_value() {
    assert_eq!(CRC32C.checksum(b"123456789"), 0xE3069283);
}

#[test]
fn test_crc16_empty_data() {
    // XMODEM has a zero init value and no final xor
    assert_eq!(CRC16.checksum(b""), 0);
}

#[test]
fn test_crc16_address_body() {
    // tag 0x11, workchain 0, zero hash: "EQAAAA...AM9c" ends with cf 5c
    let mut data = vec![0x11u8, 0x00];
    data.extend_from_slice(&[0u8; 32]);
    assert_eq!(CRC16.checksum(&data), 0xCF5C);
}

#[test]
fn test_crc16_digest_update() {
    let mut digest = CRC16.digest();
    digest.update(b"hello");
    digest.update(b" world");

    // Incremental update should produce same result
    assert_eq!(digest.finalize(), CRC16.checksum(b"hello world"));
}

#[test]
fn test_crc32c_digest_update() {
    let mut digest = CRC32C.digest();
    digest.update(b"hello");
    digest.update(b" world");

    assert_eq!(digest.finalize(), CRC32C.checksum(b"hello world"));
}

#[test]
fn test_crc32c_order_matters() {
    assert_ne!(CRC32C.checksum(b"abc"), CRC32C.checksum(b"bca"));
}
