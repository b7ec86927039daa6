// src/common/frame.rs

use arrayvec::ArrayVec;

/// Longest payload exchanged on the bus (the 21-byte power-detail answer).
pub const MAX_FRAME_LEN: usize = 21;

/// Payload bytes in a host command. The checksum follows as a fourth byte on
/// the wire (captured POLL: `74 00 02 1f`).
pub const COMMAND_LEN: usize = 3;

/// Payload of one command or response, checksum excluded.
pub type Frame = ArrayVec<u8, MAX_FRAME_LEN>;
