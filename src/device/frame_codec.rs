// src/device/frame_codec.rs

use super::SdqDevice;
use crate::common::{calculate_crc8, CycleCounter, Frame, SdqError, SdqLine};

impl<L, C, B, O> SdqDevice<L, C, B, O>
where
    L: SdqLine,
    C: CycleCounter,
{
    /// Sends one byte, least significant bit first.
    pub fn send_byte(&mut self, byte: u8) {
        for i in 0..8 {
            self.send_bit((byte >> i) & 1 == 1, i == 7);
        }
    }

    /// Sends `payload`, its checksum and the closing BREAK.
    ///
    /// Refuses with `NotConnected` outside a session so a stray caller can
    /// never drive a line the edge interrupt owns.
    pub fn send_frame(&mut self, payload: &[u8]) -> Result<(), SdqError> {
        if !self.connected {
            return Err(SdqError::NotConnected);
        }
        for &byte in payload {
            self.send_byte(byte);
        }
        self.send_byte(calculate_crc8(payload));
        self.send_break();
        Ok(())
    }

    /// Receives one byte, least significant bit first.
    pub fn receive_byte(&mut self) -> Result<u8, SdqError> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.receive_bit(i == 7)? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    /// Receives `expected_len` payload bytes plus the checksum byte and
    /// returns the verified payload. Entered at the first bit's falling edge.
    pub fn receive_frame(&mut self, expected_len: usize) -> Result<Frame, SdqError> {
        if !self.connected {
            return Err(SdqError::NotConnected);
        }
        let mut frame = Frame::new();
        for _ in 0..expected_len {
            let byte = self.receive_byte()?;
            // No request is longer than a frame can hold.
            frame.try_push(byte).map_err(|_| SdqError::InvalidCommand)?;
        }
        let received = self.receive_byte()?;
        let calculated = calculate_crc8(&frame);
        if received != calculated {
            return Err(SdqError::ChecksumMismatch {
                expected: received,
                calculated,
            });
        }
        Ok(frame)
    }
}
