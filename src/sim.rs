// src/sim.rs

//! Host-side simulation of an SDQ wire.
//!
//! A [`SimWire`] models the open-drain line shared by a scripted host and the
//! device under test, plus a cycle counter that advances one tick per read.
//! The device sees it through [`SimLine`] and [`SimClock`]; the host side is
//! written as a [`HostScript`] and loaded onto the wire up front.
//!
//! Time on the wire only moves forward: the counter advances when the device
//! reads it, and [`SimWire::replay_edges`] jumps it to the next host edge
//! while the device sits idle.

use crate::common::{calculate_crc8, timing::DRIVE_LATENCY_US, CycleCounter, LineMode, SdqLine, TimingProfile};
use crate::device::SessionReport;
use core::cell::{Cell, RefCell};
use heapless::Vec;

/// Counter ticks per microsecond of the simulated clock.
pub const SIM_CYCLES_PER_US: u32 = 16;

/// Pulses kept per side. Excess pulses are dropped.
pub const MAX_PULSES: usize = 1024;
pub const MAX_REPLY_LEN: usize = 32;
pub const MAX_REPLIES: usize = 16;
pub const MAX_REPORTS: usize = 8;

/// A low interval `[start, end)` in ticks from the wire's origin.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Pulse {
    pub start: u32,
    pub end: u32,
}

impl Pulse {
    #[inline]
    pub fn width(&self) -> u32 {
        self.end - self.start
    }
}

// --- Wire ---

/// The shared line, its two drivers and the clock.
#[derive(Debug)]
pub struct SimWire {
    origin: u32,
    now: Cell<u32>,
    mode: Cell<LineMode>,
    host: RefCell<Vec<Pulse, MAX_PULSES>>,
    /// First host pulse that has not ended yet.
    host_cursor: Cell<usize>,
    device_low_since: Cell<Option<u32>>,
    device: RefCell<Vec<Pulse, MAX_PULSES>>,
}

impl SimWire {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// A wire whose counter starts at `counter`, to exercise wrap-around.
    pub fn starting_at(counter: u32) -> Self {
        SimWire {
            origin: counter,
            now: Cell::new(counter),
            mode: Cell::new(LineMode::Analog),
            host: RefCell::new(Vec::new()),
            host_cursor: Cell::new(0),
            device_low_since: Cell::new(None),
            device: RefCell::new(Vec::new()),
        }
    }

    pub fn line(&self) -> SimLine<'_> {
        SimLine { wire: self }
    }

    pub fn clock(&self) -> SimClock<'_> {
        SimClock { wire: self }
    }

    /// Replaces the host's pulses with `script`, starting at the current time.
    pub fn load(&self, script: &HostScript) {
        let offset = self.elapsed();
        let mut host = self.host.borrow_mut();
        host.clear();
        self.host_cursor.set(0);
        for pulse in script.pulses() {
            let _ = host.push(Pulse {
                start: pulse.start + offset,
                end: pulse.end + offset,
            });
        }
    }

    /// Current counter value, without advancing it.
    pub fn now(&self) -> u32 {
        self.now.get()
    }

    pub fn mode(&self) -> LineMode {
        self.mode.get()
    }

    /// Moves the clock to the first host falling edge.
    pub fn skip_to_first_fall(&self) {
        let first = self.host.borrow().first().map(|p| p.start);
        if let Some(start) = first {
            self.jump_to(start);
        }
    }

    /// Wired-AND of both drivers at the current time.
    pub fn line_is_high(&self) -> bool {
        !(self.host_low_at(self.elapsed()) || self.device_driving_low())
    }

    /// Low pulses the device has driven so far.
    pub fn device_pulses(&self) -> Vec<Pulse, MAX_PULSES> {
        self.device.borrow().clone()
    }

    /// Decodes the device's pulses into frames, split at BREAKs.
    ///
    /// Each frame holds the payload followed by its checksum byte. Bits not
    /// closed by a BREAK are discarded.
    pub fn device_frames(&self) -> Vec<Vec<u8, MAX_REPLY_LEN>, MAX_REPLIES> {
        let timing = TimingProfile::DEFAULT;
        let mut frames = Vec::new();
        let mut current: Vec<u8, MAX_REPLY_LEN> = Vec::new();
        let (mut byte, mut bits) = (0u8, 0u32);

        for pulse in self.device.borrow().iter() {
            let width_us = pulse.width() / SIM_CYCLES_PER_US;
            let value = if width_us <= timing.one.max_us {
                true
            } else if width_us <= timing.zero.max_us {
                false
            } else {
                if !current.is_empty() {
                    let _ = frames.push(current.clone());
                }
                current.clear();
                byte = 0;
                bits = 0;
                continue;
            };

            if value {
                byte |= 1 << bits;
            }
            bits += 1;
            if bits == 8 {
                let _ = current.push(byte);
                byte = 0;
                bits = 0;
            }
        }
        frames
    }

    /// Delivers every host edge to `on_edge` while the line is armed, the way
    /// the pin interrupt would. Edges that passed while a session held the
    /// line were consumed by it and are skipped.
    pub fn replay_edges<F>(&self, on_edge: F) -> Vec<SessionReport, MAX_REPORTS>
    where
        F: FnMut() -> Option<SessionReport>,
    {
        self.replay_edges_late(0, on_edge)
    }

    /// Like [`replay_edges`](Self::replay_edges), with every interrupt
    /// entered `latency_us` after its edge.
    pub fn replay_edges_late<F>(&self, latency_us: u32, mut on_edge: F) -> Vec<SessionReport, MAX_REPORTS>
    where
        F: FnMut() -> Option<SessionReport>,
    {
        let latency = latency_us * SIM_CYCLES_PER_US;
        let mut reports = Vec::new();
        let count = self.host.borrow().len();
        for i in 0..count {
            let pulse = self.host.borrow()[i];
            for edge in [pulse.start, pulse.end] {
                if edge < self.elapsed() {
                    continue;
                }
                self.jump_to(edge + latency);
                if self.mode.get() != LineMode::InterruptBothEdges {
                    continue;
                }
                if let Some(report) = on_edge() {
                    let _ = reports.push(report);
                }
            }
        }
        reports
    }

    // --- Internals ---

    /// Ticks since the origin.
    fn elapsed(&self) -> u32 {
        self.now.get().wrapping_sub(self.origin)
    }

    fn jump_to(&self, ticks: u32) {
        self.now.set(self.origin.wrapping_add(ticks));
    }

    fn tick(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(1));
        now
    }

    fn host_low_at(&self, at: u32) -> bool {
        let host = self.host.borrow();
        let mut i = self.host_cursor.get();
        while i < host.len() && host[i].end <= at {
            i += 1;
        }
        self.host_cursor.set(i);
        i < host.len() && host[i].start <= at
    }

    fn device_driving_low(&self) -> bool {
        self.mode.get() == LineMode::OutputOpenDrain && self.device_low_since.get().is_some()
    }

    fn device_release(&self) {
        if let Some(start) = self.device_low_since.take() {
            let end = self.elapsed();
            if end > start {
                let _ = self.device.borrow_mut().push(Pulse { start, end });
            }
        }
    }
}

impl Default for SimWire {
    fn default() -> Self {
        Self::new()
    }
}

/// The device's view of the line.
#[derive(Debug, Copy, Clone)]
pub struct SimLine<'a> {
    wire: &'a SimWire,
}

impl SdqLine for SimLine<'_> {
    fn is_high(&mut self) -> bool {
        self.wire.line_is_high()
    }

    fn set_high(&mut self) {
        self.wire.device_release();
    }

    fn set_low(&mut self) {
        let wire = self.wire;
        if wire.mode.get() == LineMode::OutputOpenDrain && wire.device_low_since.get().is_none() {
            wire.device_low_since.set(Some(wire.elapsed()));
        }
    }

    fn set_mode(&mut self, mode: LineMode) {
        if mode != LineMode::OutputOpenDrain {
            self.wire.device_release();
        }
        self.wire.mode.set(mode);
    }
}

/// The device's view of the counter. Every read advances it one tick.
#[derive(Debug, Copy, Clone)]
pub struct SimClock<'a> {
    wire: &'a SimWire,
}

impl CycleCounter for SimClock<'_> {
    fn now(&self) -> u32 {
        self.wire.tick()
    }

    fn cycles_per_us(&self) -> u32 {
        SIM_CYCLES_PER_US
    }
}

// --- Host script ---

/// Builder for what the host drives onto the line.
///
/// Symbols use the same driven lengths as the device: nominal minus the
/// driver latency.
#[derive(Debug, Clone)]
pub struct HostScript {
    timing: TimingProfile,
    pulses: Vec<Pulse, MAX_PULSES>,
    /// End of the script so far, in ticks.
    cursor: u32,
}

impl HostScript {
    pub fn new() -> Self {
        Self::with_timing(TimingProfile::DEFAULT)
    }

    pub fn with_timing(timing: TimingProfile) -> Self {
        HostScript { timing, pulses: Vec::new(), cursor: 0 }
    }

    /// Replays what the device drove on `wire` as host pulses.
    pub fn from_device(wire: &SimWire) -> Self {
        let pulses = wire.device_pulses();
        let cursor = pulses.last().map_or(0, |p| p.end);
        HostScript { timing: TimingProfile::DEFAULT, pulses, cursor }
    }

    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    /// Line released for `us`.
    pub fn idle_us(mut self, us: u32) -> Self {
        self.cursor += us * SIM_CYCLES_PER_US;
        self
    }

    /// Line pulled low for `us`, then released.
    pub fn low_us(self, us: u32) -> Self {
        self.pulse_us(us, 0)
    }

    pub fn pulse_us(mut self, low_us: u32, high_us: u32) -> Self {
        let start = self.cursor;
        let end = start + low_us * SIM_CYCLES_PER_US;
        let _ = self.pulses.push(Pulse { start, end });
        self.cursor = end + high_us * SIM_CYCLES_PER_US;
        self
    }

    pub fn brk(self) -> Self {
        let (low_us, high_us) = self.timing.driven_break();
        self.pulse_us(low_us, high_us)
    }

    pub fn wake(self) -> Self {
        let wake = self.timing.wake;
        self.pulse_us(
            wake.nominal_us - DRIVE_LATENCY_US,
            wake.recovery_us - DRIVE_LATENCY_US,
        )
    }

    pub fn bit(self, value: bool, is_last_in_byte: bool) -> Self {
        let (low_us, high_us) = self.timing.driven_bit(value, is_last_in_byte);
        self.pulse_us(low_us, high_us)
    }

    /// One byte, least significant bit first.
    pub fn byte(mut self, byte: u8) -> Self {
        for i in 0..8 {
            self = self.bit((byte >> i) & 1 == 1, i == 7);
        }
        self
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        for &byte in bytes {
            self = self.byte(byte);
        }
        self
    }

    /// A complete request: BREAK, payload, checksum, BREAK.
    pub fn command(self, payload: &[u8]) -> Self {
        self.brk().bytes(payload).byte(calculate_crc8(payload)).brk()
    }
}

impl Default for HostScript {
    fn default() -> Self {
        Self::new()
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_pulses_drive_line() {
        let wire = SimWire::new();
        wire.load(&HostScript::new().idle_us(1).low_us(2));
        assert!(wire.line_is_high());
        wire.jump_to(SIM_CYCLES_PER_US);
        assert!(!wire.line_is_high());
        wire.jump_to(3 * SIM_CYCLES_PER_US);
        assert!(wire.line_is_high());
    }

    #[test]
    fn test_device_drives_only_in_output_mode() {
        let wire = SimWire::new();
        let mut line = wire.line();
        line.set_low();
        assert!(wire.line_is_high());

        line.set_mode(LineMode::OutputOpenDrain);
        line.set_low();
        assert!(!wire.line_is_high());
        wire.jump_to(10);
        line.set_high();
        assert!(wire.line_is_high());
        assert_eq!(&wire.device_pulses()[..], &[Pulse { start: 0, end: 10 }]);
    }

    #[test]
    fn test_clock_advances_per_read() {
        let wire = SimWire::new();
        let clock = wire.clock();
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.now(), 1);
        assert_eq!(wire.now(), 2);
    }

    #[test]
    fn test_command_script_layout() {
        let script = HostScript::new().command(&[0x74, 0x00, 0x02]);
        // BREAK, 32 bits, BREAK.
        assert_eq!(script.pulses().len(), 34);
        let first = script.pulses()[0];
        assert_eq!(first.width(), 13 * SIM_CYCLES_PER_US);
        // 0x74 is sent LSB first: its first bit is a 0.
        assert_eq!(script.pulses()[1].width(), 6 * SIM_CYCLES_PER_US);
    }
}
