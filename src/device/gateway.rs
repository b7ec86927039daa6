// src/device/gateway.rs

use super::collaborators::{SessionObserver, SessionReport, UartBridge};
use super::{ResetKind, SdqDevice, SessionState};
use crate::common::{CycleCounter, SdqLine};
use log::info;

/// Entry point from the pin's both-edge interrupt.
///
/// Measures low pulses while the bus is idle and runs a session inside a
/// critical section whenever one qualifies as a reset.
#[derive(Debug)]
pub struct SdqGateway<L, C, B = (), O = ()> {
    device: SdqDevice<L, C, B, O>,
    /// Counter value at the last falling edge, if no rising edge followed yet.
    pulse_start: Option<u32>,
}

impl<L, C, B, O> SdqGateway<L, C, B, O>
where
    L: SdqLine,
    C: CycleCounter,
    B: UartBridge,
    O: SessionObserver,
{
    pub fn new(device: SdqDevice<L, C, B, O>) -> Self {
        SdqGateway { device, pulse_start: None }
    }

    /// Arms the line: released high with both edge interrupts enabled.
    pub fn start(&mut self) {
        self.pulse_start = None;
        self.device.listening = true;
        self.device.command_executed = false;
        self.device.arm_line();
        info!("SDQ: listening in mode {}", self.device.mode);
        let status = self.device.status();
        self.device.observer.on_status(status);
    }

    /// Disarms the line and clears the session flags. Edges seen afterwards
    /// are ignored.
    pub fn stop(&mut self) {
        self.pulse_start = None;
        self.device.listening = false;
        self.device.error = None;
        self.device.reset_in_progress = false;
        self.device.park_line();
        info!("SDQ: stopped");
        let status = self.device.status();
        self.device.observer.on_status(status);
    }

    /// Handles one edge interrupt.
    ///
    /// Returns the report of the session the edge started, if any. Sessions
    /// run to completion before this returns.
    ///
    /// Edges alternate: once a falling edge is recorded, the next edge is its
    /// rising edge whatever the line reads by then. A late interrupt can find
    /// the line already low in the first bit of the command; the width still
    /// comes from the two timestamps and the session picks up mid-bit.
    pub fn on_edge(&mut self) -> Option<SessionReport> {
        if !self.device.listening {
            return None;
        }
        let now = self.device.counter.now();

        let Some(start) = self.pulse_start.take() else {
            if !self.device.line.is_high() {
                self.pulse_start = Some(now);
                self.device.state = SessionState::ClassifyingReset;
            }
            return None;
        };

        let width_us = now.wrapping_sub(start) / self.device.counter.cycles_per_us().max(1);
        match self.classify_reset(width_us) {
            Some(kind) => Some(critical_section::with(|_| self.device.run_session(kind))),
            None => {
                self.device.state = SessionState::Armed;
                None
            }
        }
    }

    /// Reset class of a completed low pulse, or `None` if it is no reset.
    pub fn classify_reset(&self, width_us: u32) -> Option<ResetKind> {
        let brk = self.device.config.timing.brk;
        if !brk.accepts(width_us) {
            return None;
        }
        Some(if width_us < brk.midpoint_us() {
            ResetKind::Short
        } else {
            ResetKind::Standard
        })
    }

    pub fn device(&self) -> &SdqDevice<L, C, B, O> {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut SdqDevice<L, C, B, O> {
        &mut self.device
    }

    /// Stops the bus and hands the device back.
    pub fn free(mut self) -> SdqDevice<L, C, B, O> {
        self.stop();
        self.device
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{LineMode, Mode, SdqError};
    use crate::sim::{HostScript, SimClock, SimLine, SimWire};

    const POLL: [u8; 3] = [0x74, 0x00, 0x02];

    fn started(wire: &SimWire, mode: Mode) -> SdqGateway<SimLine<'_>, SimClock<'_>> {
        let mut gateway = SdqGateway::new(SdqDevice::new(wire.line(), wire.clock()).with_mode(mode));
        gateway.start();
        gateway
    }

    #[test]
    fn test_start_arms_line() {
        let wire = SimWire::new();
        let gateway = started(&wire, Mode::Dfu);
        assert!(gateway.device().is_listening());
        assert_eq!(gateway.device().state(), SessionState::Armed);
        assert_eq!(wire.mode(), LineMode::InterruptBothEdges);
        assert!(wire.line_is_high());
    }

    #[test]
    fn test_break_window_boundaries() {
        let cases = [
            (11, None),
            (12, Some(ResetKind::Short)),
            (13, Some(ResetKind::Short)),
            (14, Some(ResetKind::Standard)),
            (16, Some(ResetKind::Standard)),
            (17, None),
        ];
        for (width_us, expected) in cases {
            let wire = SimWire::new();
            wire.load(&HostScript::new().idle_us(50).low_us(width_us).idle_us(100));
            let mut gateway = started(&wire, Mode::Dfu);

            let reports = wire.replay_edges(|| gateway.on_edge());
            match expected {
                Some(kind) => {
                    assert_eq!(reports.len(), 1, "{}us must open a session", width_us);
                    assert_eq!(reports[0].last_reset, Some(kind), "{}us", width_us);
                    // No frame followed the break.
                    assert_eq!(reports[0].error, Some(SdqError::Timeout));
                }
                None => {
                    assert!(reports.is_empty(), "{}us must be ignored", width_us);
                    assert_eq!(gateway.device().state(), SessionState::Armed);
                }
            }
        }
    }

    #[test]
    fn test_data_pulses_are_ignored_while_idle() {
        let wire = SimWire::new();
        wire.load(&HostScript::new().idle_us(50).bytes(&[0x00, 0xff]).idle_us(100));
        let mut gateway = started(&wire, Mode::Dfu);
        assert!(wire.replay_edges(|| gateway.on_edge()).is_empty());
        assert!(wire.device_pulses().is_empty());
    }

    #[test]
    fn test_rising_edge_without_falling_edge_is_ignored() {
        let wire = SimWire::new();
        let mut gateway = started(&wire, Mode::Dfu);
        assert_eq!(gateway.on_edge(), None);
        assert_eq!(gateway.device().state(), SessionState::Armed);
    }

    #[test]
    fn test_late_edge_interrupts_still_open_a_session() {
        // Up to 6us late, the first bit is still decoded from its remaining low time.
        for latency_us in 0..=6 {
            let wire = SimWire::new();
            wire.load(&HostScript::new().idle_us(50).command(&POLL).idle_us(100));
            let mut gateway = started(&wire, Mode::QuerySerial);

            let reports = wire.replay_edges_late(latency_us, || gateway.on_edge());
            assert_eq!(reports.len(), 1, "{}us late", latency_us);
            assert_eq!(reports[0].error, None, "{}us late", latency_us);
            assert_eq!(reports[0].last_reset, Some(ResetKind::Short));
            assert!(reports[0].command_executed);
            assert_eq!(wire.device_frames().len(), 1);
        }
    }

    #[test]
    fn test_very_late_edge_still_reports_the_session() {
        // Too late to see the first bit whole: the reset is not lost, the
        // misread frame fails its checksum.
        for latency_us in [8, 9] {
            let wire = SimWire::new();
            wire.load(&HostScript::new().idle_us(50).command(&POLL).idle_us(100));
            let mut gateway = started(&wire, Mode::QuerySerial);

            // The closing BREAK is left unread and opens a second, empty session.
            let reports = wire.replay_edges_late(latency_us, || gateway.on_edge());
            assert!(!reports.is_empty(), "{}us late", latency_us);
            assert!(
                matches!(reports[0].error, Some(SdqError::ChecksumMismatch { .. })),
                "{}us late: {:?}",
                latency_us,
                reports[0].error
            );
            assert!(wire.device_frames().is_empty());
            assert_eq!(gateway.device().state(), SessionState::Armed);
        }
    }

    #[test]
    fn test_line_is_rearmed_after_each_session() {
        let wire = SimWire::new();
        wire.load(
            &HostScript::new()
                .idle_us(50)
                .command(&POLL)
                .idle_us(2_000)
                .command(&POLL)
                .idle_us(100),
        );
        let mut gateway = started(&wire, Mode::QuerySerial);

        let reports = wire.replay_edges(|| gateway.on_edge());
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.error.is_none() && r.command_executed));
        assert_eq!(wire.device_frames().len(), 2);
        assert_eq!(wire.mode(), LineMode::InterruptBothEdges);
        assert!(gateway.device().is_listening());
        assert!(!gateway.device().is_connected());
    }

    #[test]
    fn test_stop_ignores_edges_and_parks_line() {
        let wire = SimWire::new();
        wire.load(&HostScript::new().idle_us(50).command(&POLL).idle_us(100));
        let mut gateway = started(&wire, Mode::QuerySerial);
        gateway.stop();

        assert!(wire.replay_edges(|| gateway.on_edge()).is_empty());
        assert!(wire.device_pulses().is_empty());
        assert_eq!(wire.mode(), LineMode::Analog);
        assert_eq!(gateway.device().state(), SessionState::Stopped);
    }

    #[test]
    fn test_stop_clears_faults_and_pending_handshake() {
        let wire = SimWire::new();
        wire.load(&HostScript::new().idle_us(50).command(&[0x42, 0, 0]).idle_us(100));
        let mut gateway = started(&wire, Mode::Dfu);
        wire.replay_edges(|| gateway.on_edge());
        assert!(gateway.device().status().faulted);
        gateway.device_mut().reset_in_progress = true;

        gateway.stop();
        assert_eq!(gateway.device().error(), None);
        assert!(!gateway.device().reset_in_progress());
        assert!(!gateway.device().status().listening);
    }
}
