// src/device/engine.rs

use super::bit_codec::LowPulse;
use super::collaborators::{SessionObserver, SessionReport, UartBridge};
use super::waiter::HIGH;
use super::{ResetKind, SdqDevice, SessionState};
use crate::common::{
    responses::{self, response_for},
    timing::FRAME_START_SLACK_US,
    CycleCounter, Frame, Mode, Request, SdqError, SdqLine, COMMAND_LEN,
};
use log::{debug, info, warn};

/// What the session does after a command has been answered.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Flow {
    /// Stay connected and wait for the host's next break.
    Continue,
    /// The exchange is complete.
    End,
}

impl<L, C, B, O> SdqDevice<L, C, B, O>
where
    L: SdqLine,
    C: CycleCounter,
    B: UartBridge,
    O: SessionObserver,
{
    /// Runs one session, opened by a reset pulse of class `kind` whose rising
    /// edge has just been seen. Returns with the line re-armed.
    pub(super) fn run_session(&mut self, kind: ResetKind) -> SessionReport {
        self.resets_in_session = 0;
        self.error = None;
        self.claim_line();
        self.begin_exchange(kind);

        let outcome = loop {
            match self.serve_command() {
                Ok(Flow::End) => break Ok(()),
                Ok(Flow::Continue) => match self.await_next_break() {
                    Ok(Some(next)) => self.begin_exchange(next),
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                },
                Err(SdqError::ResetInProgress) => {
                    // The host restarted mid-frame; the break is already consumed.
                    self.error = Some(SdqError::ResetInProgress);
                    self.state = SessionState::ClassifyingReset;
                    let next = self.last_reset.unwrap_or(ResetKind::Standard);
                    self.begin_exchange(next);
                }
                Err(e) => break Err(e),
            }
        };

        self.end_session(outcome)
    }

    /// Enters `Connected` after a valid reset.
    fn begin_exchange(&mut self, kind: ResetKind) {
        self.observer.on_reset(kind, self.error);
        self.connected = true;
        self.error = None;
        self.last_reset = Some(kind);
        self.resets_in_session = self.resets_in_session.saturating_add(1);
        self.state = SessionState::Connected;
    }

    /// Receives one command and answers it.
    fn serve_command(&mut self) -> Result<Flow, SdqError> {
        let command = self.receive_command()?;
        self.state = SessionState::Dispatching;
        self.dispatch(&command)
    }

    /// Receives a command frame framed by the opening break's recovery and
    /// the closing break, then waits out the closing break's recovery.
    fn receive_command(&mut self) -> Result<Frame, SdqError> {
        let brk = self.config.timing.brk;
        // A late reset interrupt may already find the first bit under way.
        if !self.wait_while(HIGH, brk.recovery_us + FRAME_START_SLACK_US) {
            return Err(SdqError::Timeout);
        }

        let command = self.receive_frame(COMMAND_LEN)?;

        match self.measure_low_pulse() {
            LowPulse::Break(_) => {}
            LowPulse::Stuck => return Err(SdqError::Timeout),
            _ => return Err(SdqError::BitTiming),
        }
        self.delay_us(brk.recovery_us);
        Ok(command)
    }

    fn dispatch(&mut self, command: &[u8]) -> Result<Flow, SdqError> {
        match Request::from_u8(command[0]) {
            Request::Poll => self.answer_poll(),
            Request::Power => {
                self.respond(responses::POWER_ACK)?;
                self.command_executed = true;
                Ok(Flow::End)
            }
            Request::Unknown76 => {
                if self.config.answer_unknown_76 {
                    self.respond(responses::UNKNOWN_76_ANSWER)?;
                }
                Ok(Flow::Continue)
            }
            Request::Unrecognized(_) => Err(SdqError::InvalidCommand),
        }
    }

    /// Answers a POLL according to the selected mode.
    fn answer_poll(&mut self) -> Result<Flow, SdqError> {
        let mode = self.mode;
        let Some(frame) = response_for(mode) else {
            // Mode::None: stay silent.
            self.command_executed = true;
            return Ok(Flow::End);
        };

        if mode.is_two_phase() {
            if !self.reset_in_progress {
                self.respond(responses::FORCE_RESET)?;
                self.reset_in_progress = true;
                return Ok(Flow::Continue);
            }
            self.respond(frame)?;
            self.reset_in_progress = false;
        } else {
            self.respond(frame)?;
            if mode == Mode::Recovery {
                self.push_to_bridge(responses::RECOVERY_PAYLOAD)?;
            }
        }
        self.command_executed = true;
        Ok(Flow::End)
    }

    fn respond(&mut self, frame: &[u8]) -> Result<(), SdqError> {
        self.state = SessionState::Responding;
        self.send_frame(frame)
    }

    /// Writes `payload` through the bridge, retrying `WouldBlock` until the
    /// bridge timeout runs out.
    fn push_to_bridge(&mut self, payload: &[u8]) -> Result<(), SdqError> {
        let start = self.counter.now();
        let budget = self.us_to_ticks(self.config.bridge_timeout_us);
        let mut sent = 0;

        while sent < payload.len() {
            match self.bridge.write(&payload[sent..]) {
                Ok(n) if n > 0 => sent += n.min(payload.len() - sent),
                Ok(_) | Err(nb::Error::WouldBlock) => {
                    if self.counter.now().wrapping_sub(start) >= budget {
                        return Err(SdqError::Timeout);
                    }
                }
                Err(nb::Error::Other(e)) => {
                    warn!("SDQ: bridge write failed: {:?}", e);
                    return Err(SdqError::Bridge);
                }
            }
        }
        Ok(())
    }

    /// Waits, still connected, for the host's next break.
    ///
    /// `Ok(None)` means the host went quiet and the session may end.
    fn await_next_break(&mut self) -> Result<Option<ResetKind>, SdqError> {
        let idle_timeout_us = self.config.idle_timeout_us;
        loop {
            if !self.wait_while(HIGH, idle_timeout_us) {
                return Ok(None);
            }
            match self.measure_low_pulse() {
                LowPulse::Break(kind) => return Ok(Some(kind)),
                // The host is waking the bus; its break follows the recovery.
                LowPulse::Wake => continue,
                LowPulse::Stuck => return Err(SdqError::Timeout),
                _ => return Err(SdqError::BitTiming),
            }
        }
    }

    /// Records the outcome, re-arms the line and notifies the observer.
    fn end_session(&mut self, outcome: Result<(), SdqError>) -> SessionReport {
        if let Err(e) = outcome {
            self.error = Some(e);
            self.state = SessionState::Aborted;
        }
        self.connected = false;
        self.arm_line();

        let report = SessionReport {
            mode: self.mode,
            error: self.error,
            command_executed: self.command_executed,
            reset_in_progress: self.reset_in_progress,
            last_reset: self.last_reset,
            resets: self.resets_in_session,
        };
        match report.error {
            Some(e) => warn!("SDQ: session aborted in mode {}: {}", report.mode, e),
            None if report.command_executed => info!("SDQ: mode {} executed", report.mode),
            None => debug!("SDQ: session ended (reset pending: {})", report.reset_in_progress),
        }

        self.observer.on_session_end(&report);
        let status = self.status();
        self.observer.on_status(status);
        report
    }
}
