// src/device/mod.rs

// Sub-modules; each adds an `impl` block to `SdqDevice`.
mod bit_codec;
pub mod collaborators;
mod engine;
mod frame_codec;
pub mod gateway;
mod waiter;

pub use bit_codec::LowPulse;
pub use collaborators::{BusStatus, SessionObserver, SessionReport, UartBridge};
pub use gateway::SdqGateway;

use crate::common::{error::SdqError, hal_traits::LineMode, mode::Mode, CycleCounter, SdqLine};
use crate::config::SdqConfig;

/// Width class of the reset pulse that opened a session.
///
/// Passed to the session as a speed hint, the way single-wire buses pick
/// overdrive timing from the reset width.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetKind {
    /// Shorter than the BREAK window midpoint.
    Short,
    /// At or above the BREAK window midpoint.
    Standard,
}

/// Where the protocol state machine currently is.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// Not listening; the line is inert.
    Stopped,
    /// Idle, waiting for an edge interrupt.
    Armed,
    /// Measuring a candidate reset pulse.
    ClassifyingReset,
    /// Receiving a command frame.
    Connected,
    /// Selecting the answer for a received command.
    Dispatching,
    /// Transmitting a response frame.
    Responding,
    /// A fault ended the session; transient until the line is re-armed.
    Aborted,
}

/// The SDQ bus handle: one line, one counter, and the session state.
///
/// Exactly one `SdqDevice` drives a given line. It is normally owned by an
/// [`SdqGateway`], which feeds it edge interrupts.
#[derive(Debug)]
pub struct SdqDevice<L, C, B = (), O = ()> {
    line: L,
    counter: C,
    bridge: B,
    observer: O,
    config: SdqConfig,
    mode: Mode,
    state: SessionState,
    error: Option<SdqError>,
    listening: bool,
    connected: bool,
    command_executed: bool,
    reset_in_progress: bool,
    last_reset: Option<ResetKind>,
    resets_in_session: u8,
}

impl<L, C> SdqDevice<L, C>
where
    L: SdqLine,
    C: CycleCounter,
{
    /// Binds a line and a cycle counter. The line is left untouched until
    /// [`SdqGateway::start`].
    pub fn new(line: L, counter: C) -> Self {
        SdqDevice {
            line,
            counter,
            bridge: (),
            observer: (),
            config: SdqConfig::DEFAULT,
            mode: Mode::None,
            state: SessionState::Stopped,
            error: None,
            listening: false,
            connected: false,
            command_executed: false,
            reset_in_progress: false,
            last_reset: None,
            resets_in_session: 0,
        }
    }
}

impl<L, C, B, O> SdqDevice<L, C, B, O>
where
    L: SdqLine,
    C: CycleCounter,
{
    /// Attaches the UART bridge used by [`Mode::Recovery`].
    pub fn with_bridge<B2: UartBridge>(self, bridge: B2) -> SdqDevice<L, C, B2, O> {
        SdqDevice {
            line: self.line,
            counter: self.counter,
            bridge,
            observer: self.observer,
            config: self.config,
            mode: self.mode,
            state: self.state,
            error: self.error,
            listening: self.listening,
            connected: self.connected,
            command_executed: self.command_executed,
            reset_in_progress: self.reset_in_progress,
            last_reset: self.last_reset,
            resets_in_session: self.resets_in_session,
        }
    }

    /// Attaches the observer notified of resets, session results and status.
    pub fn with_observer<O2: SessionObserver>(self, observer: O2) -> SdqDevice<L, C, B, O2> {
        SdqDevice {
            line: self.line,
            counter: self.counter,
            bridge: self.bridge,
            observer,
            config: self.config,
            mode: self.mode,
            state: self.state,
            error: self.error,
            listening: self.listening,
            connected: self.connected,
            command_executed: self.command_executed,
            reset_in_progress: self.reset_in_progress,
            last_reset: self.last_reset,
            resets_in_session: self.resets_in_session,
        }
    }

    pub fn with_config(mut self, config: SdqConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Selects the mode answered on the next POLL.
    ///
    /// Switching mode abandons a half-finished two-phase handshake.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            self.reset_in_progress = false;
        }
        self.mode = mode;
    }

    // --- State accessors ---

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn error(&self) -> Option<SdqError> {
        self.error
    }

    #[inline]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[inline]
    pub fn command_executed(&self) -> bool {
        self.command_executed
    }

    #[inline]
    pub fn reset_in_progress(&self) -> bool {
        self.reset_in_progress
    }

    #[inline]
    pub fn last_reset(&self) -> Option<ResetKind> {
        self.last_reset
    }

    #[inline]
    pub fn config(&self) -> &SdqConfig {
        &self.config
    }

    /// Snapshot for status indicators.
    pub fn status(&self) -> BusStatus {
        BusStatus {
            listening: self.listening,
            faulted: self.error.map_or(false, |e| e.is_fault()),
            command_executed: self.command_executed,
        }
    }

    pub fn line(&self) -> &L {
        &self.line
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Parks the line and gives the parts back.
    pub fn free(mut self) -> (L, C, B, O) {
        self.listening = false;
        self.park_line();
        (self.line, self.counter, self.bridge, self.observer)
    }

    // --- Line ownership ---

    /// Hands the line to the edge interrupt: released high, then armed.
    fn arm_line(&mut self) {
        self.line.set_high();
        self.line.set_mode(LineMode::InterruptBothEdges);
        self.state = SessionState::Armed;
    }

    /// Takes the line for a session: output, released high.
    fn claim_line(&mut self) {
        self.line.set_mode(LineMode::OutputOpenDrain);
        self.line.set_high();
    }

    /// Leaves the line inert: released high, analog, no interrupt.
    fn park_line(&mut self) {
        self.line.set_high();
        self.line.set_mode(LineMode::Analog);
        self.state = SessionState::Stopped;
    }
}
