// src/device/bit_codec.rs

use super::waiter::{HIGH, LOW};
use super::{ResetKind, SdqDevice};
use crate::common::{CycleCounter, SdqError, SdqLine};

/// Classification of one low pulse, measured from its falling edge.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LowPulse {
    One,
    Zero,
    Break(ResetKind),
    Wake,
    /// Rose between two symbol windows.
    Invalid,
    /// Still low after the longest WAKE.
    Stuck,
}

impl<L, C, B, O> SdqDevice<L, C, B, O>
where
    L: SdqLine,
    C: CycleCounter,
{
    // --- Transmit ---

    /// Drives one bit: low for the bit's assertion, then released for its
    /// recovery. The last bit of a byte gets the longer stop recovery.
    pub fn send_bit(&mut self, value: bool, is_last_in_byte: bool) {
        let (assert_us, recovery_us) = self.config.timing.driven_bit(value, is_last_in_byte);
        self.line.set_low();
        self.delay_us(assert_us);
        self.line.set_high();
        self.delay_us(recovery_us);
    }

    /// Drives a BREAK: the frame delimiter.
    pub fn send_break(&mut self) {
        let (assert_us, recovery_us) = self.config.timing.driven_break();
        self.line.set_low();
        self.delay_us(assert_us);
        self.line.set_high();
        self.delay_us(recovery_us);
    }

    // --- Receive ---

    /// Decodes one bit. Must be entered at (or just after) the bit's falling
    /// edge and returns at the next falling edge.
    ///
    /// A low held into the BREAK window means the host restarted the frame:
    /// the reset is recorded and `ResetInProgress` returned, with the line
    /// already back high.
    pub fn receive_bit(&mut self, is_last_in_byte: bool) -> Result<bool, SdqError> {
        let timing = self.config.timing;
        let value = if self.wait_while(LOW, timing.one.max_us) {
            true
        } else if self.wait_while(LOW, timing.zero.max_us.saturating_sub(timing.one.max_us)) {
            false
        } else {
            return Err(match self.measure_held_low() {
                LowPulse::Break(kind) => {
                    self.last_reset = Some(kind);
                    SdqError::ResetInProgress
                }
                LowPulse::Stuck => SdqError::Timeout,
                _ => SdqError::BitTiming,
            });
        };

        // The recovery must end with the next symbol's falling edge.
        if self.wait_while(HIGH, timing.bit_recovery_us(value, is_last_in_byte)) {
            Ok(value)
        } else {
            Err(SdqError::BitTiming)
        }
    }

    /// Measures a low pulse from its falling edge up to the rising edge, or
    /// until it has outlasted a WAKE.
    pub fn measure_low_pulse(&mut self) -> LowPulse {
        let timing = self.config.timing;
        if self.wait_while(LOW, timing.one.max_us) {
            return LowPulse::One;
        }
        if self.wait_while(LOW, timing.zero.max_us.saturating_sub(timing.one.max_us)) {
            return LowPulse::Zero;
        }
        self.measure_held_low()
    }

    /// Continues a measurement for a line already low past the ZERO window.
    ///
    /// Windows of an overlapping profile collapse to zero width.
    fn measure_held_low(&mut self) -> LowPulse {
        let t = self.config.timing;
        let stages = [
            (t.brk.min_us.saturating_sub(t.zero.max_us), LowPulse::Invalid),
            (t.brk.midpoint_us().saturating_sub(t.brk.min_us), LowPulse::Break(ResetKind::Short)),
            (t.brk.max_us.saturating_sub(t.brk.midpoint_us()), LowPulse::Break(ResetKind::Standard)),
            (t.wake.min_us.saturating_sub(t.brk.max_us), LowPulse::Invalid),
            (t.wake.max_us.saturating_sub(t.wake.min_us), LowPulse::Wake),
        ];
        for (window_us, class) in stages {
            if self.wait_while(LOW, window_us) {
                return class;
            }
        }
        LowPulse::Stuck
    }
}
