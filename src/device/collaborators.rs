// src/device/collaborators.rs

//! Seams between the protocol engine and the rest of the firmware.

use super::ResetKind;
use crate::common::{Mode, SdqError};

/// Byte sink behind the diagnostic UART, fed in [`Mode::Recovery`].
///
/// Writes are non-blocking: return `WouldBlock` while the sink is busy and
/// the number of bytes taken otherwise.
pub trait UartBridge {
    type Error: core::fmt::Debug;

    fn write(&mut self, bytes: &[u8]) -> nb::Result<usize, Self::Error>;
}

/// No bridge attached; every write is refused.
impl UartBridge for () {
    type Error = ();

    fn write(&mut self, _bytes: &[u8]) -> nb::Result<usize, ()> {
        Err(nb::Error::Other(()))
    }
}

/// Receives notifications from inside the session.
///
/// Callbacks run inside the critical section that holds the line, so they
/// must only record; anything slow belongs in the main loop.
pub trait SessionObserver {
    /// A valid reset pulse was seen (also mid-frame).
    ///
    /// `error` is the bus error just before the reset clears it: `None` when
    /// the reset opens a session or follows a completed exchange, and
    /// [`SdqError::ResetInProgress`] when it cut a frame short.
    fn on_reset(&mut self, _kind: ResetKind, _error: Option<SdqError>) {}

    /// A session ended, with or without a fault.
    fn on_session_end(&mut self, _report: &SessionReport) {}

    /// Listening or fault state changed.
    fn on_status(&mut self, _status: BusStatus) {}
}

impl SessionObserver for () {}

/// Outcome of one session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionReport {
    pub mode: Mode,
    pub error: Option<SdqError>,
    pub command_executed: bool,
    /// The first half of a two-phase handshake is done.
    pub reset_in_progress: bool,
    pub last_reset: Option<ResetKind>,
    /// Reset pulses seen, the opening one included.
    pub resets: u8,
}

/// Indicator-level view of the bus.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusStatus {
    pub listening: bool,
    pub faulted: bool,
    pub command_executed: bool,
}
