// src/common/crc.rs

use super::error::SdqError;
use crc::{Algorithm, Crc};

/// CRC-8 used on every SDQ frame, as recovered from captured traffic.
/// Polynomial: 0x31
/// Initial Value: 0xFF
/// Input Reflected: true
/// Output Reflected: true
/// Final XOR: 0x00
/// Check Value: 0x0B (for "123456789")
/// Residue: 0x00
pub const SDQ_CRC: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x31,
    init: 0xFF,
    refin: true,
    refout: true,
    xorout: 0x00,
    check: 0x0B,
    residue: 0x00,
};

// Create a Crc instance for the SDQ algorithm for reuse.
const CRC_COMPUTER: Crc<u8> = Crc::<u8>::new(&SDQ_CRC);

/// Calculates the SDQ checksum over `data`.
///
/// The checksum covers every byte of a frame except itself and is sent as the
/// frame's final byte.
#[inline]
pub fn calculate_crc8(data: &[u8]) -> u8 {
    CRC_COMPUTER.checksum(data)
}

/// Verifies a frame whose last byte is its checksum.
///
/// # Returns
///
/// * `Ok(payload)` with the checksum stripped if it matches.
/// * `Err(SdqError::ChecksumMismatch)` otherwise. An empty buffer has no
///   checksum to compare and is reported as a mismatch against zero.
pub fn verify_frame_crc8(frame_with_crc: &[u8]) -> Result<&[u8], SdqError> {
    let (received, payload) = match frame_with_crc.split_last() {
        Some((last, rest)) => (*last, rest),
        None => {
            return Err(SdqError::ChecksumMismatch {
                expected: 0,
                calculated: calculate_crc8(&[]),
            })
        }
    };

    let calculated = calculate_crc8(payload);
    if calculated == received {
        Ok(payload)
    } else {
        Err(SdqError::ChecksumMismatch { expected: received, calculated })
    }
}
