// src/common/error.rs

/// Everything that can end (or restart) an SDQ session.
///
/// A bus holds at most one of these at a time; "no error" is `None` in
/// [`SdqDevice::error`](crate::SdqDevice::error).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SdqError {
    /// A new reset pulse arrived while a frame was being received.
    /// This is a restart signal, not a failure.
    #[error("Reset in progress")]
    ResetInProgress,

    /// Attempted to transmit before a reset handshake connected the bus.
    #[error("Bus not connected")]
    NotConnected,

    /// The request class byte is not one we know how to answer.
    #[error("Invalid command")]
    InvalidCommand,

    /// A bit's assertion or recovery phase did not fit any known window.
    #[error("Bit timing error")]
    BitTiming,

    /// An expected edge never arrived within the maximum bus hold time.
    #[error("Operation timed out")]
    Timeout,

    /// Another responder drove the line at the same time.
    /// Reserved: a single-responder bus never reports it.
    #[error("Presence conflict")]
    PresenceConflict,

    /// Received checksum does not match the one calculated over the frame.
    #[error("Checksum mismatch: expected {expected:#04x}, calculated {calculated:#04x}")]
    ChecksumMismatch { expected: u8, calculated: u8 },

    /// The UART bridge refused the out-of-band payload.
    #[error("UART bridge error")]
    Bridge,
}

impl SdqError {
    /// Whether this state should be reported as a failure.
    ///
    /// `ResetInProgress` only tells the engine to start over.
    #[inline]
    pub const fn is_fault(&self) -> bool {
        !matches!(self, SdqError::ResetInProgress)
    }
}
