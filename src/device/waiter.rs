// src/device/waiter.rs

use super::SdqDevice;
use crate::common::{CycleCounter, SdqLine};

/// Level argument for [`SdqDevice::wait_while`]: the line is released.
pub(crate) const HIGH: bool = true;
/// Level argument for [`SdqDevice::wait_while`]: the line is pulled down.
pub(crate) const LOW: bool = false;

impl<L, C, B, O> SdqDevice<L, C, B, O>
where
    L: SdqLine,
    C: CycleCounter,
{
    /// Busy-waits while the line stays at `level`, for at most `timeout_us`.
    ///
    /// Returns `true` if the line left `level` within the timeout and `false`
    /// if it was still at `level` when the timeout ran out. Counter wrap
    /// around is handled by modular subtraction.
    pub fn wait_while(&mut self, level: bool, timeout_us: u32) -> bool {
        let start = self.counter.now();
        let ticks = self.us_to_ticks(timeout_us);
        loop {
            let elapsed = self.counter.now().wrapping_sub(start);
            if self.line.is_high() != level {
                return elapsed <= ticks;
            }
            if elapsed >= ticks {
                return false;
            }
        }
    }

    /// Spins for `us` microseconds on the cycle counter.
    pub fn delay_us(&self, us: u32) {
        let start = self.counter.now();
        let ticks = self.us_to_ticks(us);
        while self.counter.now().wrapping_sub(start) < ticks {}
    }

    #[inline]
    pub(crate) fn us_to_ticks(&self, us: u32) -> u32 {
        us.saturating_mul(self.counter.cycles_per_us())
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{HostScript, SimWire, SIM_CYCLES_PER_US};
    use crate::SdqDevice;

    #[test]
    fn test_wait_while_sees_level_change() {
        let wire = SimWire::new();
        wire.load(&HostScript::new().idle_us(10).low_us(5).idle_us(100));
        let mut device = SdqDevice::new(wire.line(), wire.clock());

        assert!(device.wait_while(HIGH, 20));
        assert!(device.wait_while(LOW, 6));
        assert!(!device.wait_while(HIGH, 50));
    }

    #[test]
    fn test_wait_while_times_out() {
        let wire = SimWire::new();
        wire.load(&HostScript::new().idle_us(10).low_us(5));
        let mut device = SdqDevice::new(wire.line(), wire.clock());
        assert!(!device.wait_while(HIGH, 3));
        assert!(wire.now() >= 3 * SIM_CYCLES_PER_US);
    }

    #[test]
    fn test_wait_while_handles_counter_wrap() {
        let wire = SimWire::starting_at(u32::MAX - 20 * SIM_CYCLES_PER_US);
        wire.load(&HostScript::new().idle_us(40).low_us(5));
        let mut device = SdqDevice::new(wire.line(), wire.clock());
        assert!(device.wait_while(HIGH, 45));
        assert!(wire.now() < 100 * SIM_CYCLES_PER_US);
    }

    #[test]
    fn test_delay_us_advances_clock() {
        let wire = SimWire::new();
        let device = SdqDevice::new(wire.line(), wire.clock());
        let before = wire.now();
        device.delay_us(7);
        let spent = wire.now().wrapping_sub(before);
        assert!(spent >= 7 * SIM_CYCLES_PER_US);
        assert!(spent <= 7 * SIM_CYCLES_PER_US + 2);
    }
}
