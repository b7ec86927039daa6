// src/common/timing.rs

// All SDQ symbols are a low "assertion" phase followed by a released
// "recovery" phase. The assertion length carries the meaning: a short low is
// a 1, a long low is a 0, longer still is a BREAK and the longest is a WAKE.
// Values below are in microseconds.

/// Settling time of the line driver. Every driven phase is emitted this much
/// shorter than its nominal length.
pub const DRIVE_LATENCY_US: u32 = 1;

/// Slack allowed after a break's recovery before the first bit must fall.
pub const FRAME_START_SLACK_US: u32 = 1;

/// How long a connected session waits for the host's next break before it
/// ends on its own.
pub const IDLE_TIMEOUT_US: u32 = 15_000;

/// How long the UART bridge may take to accept an out-of-band payload.
pub const BRIDGE_TIMEOUT_US: u32 = 50_000;

/// Timing of one symbol class.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SymbolTiming {
    /// Shortest low phase accepted as this symbol.
    pub min_us: u32,
    /// Longest low phase accepted as this symbol.
    pub max_us: u32,
    /// Low phase length when transmitting.
    pub nominal_us: u32,
    /// High phase length after the low phase.
    pub recovery_us: u32,
}

impl SymbolTiming {
    pub const fn new(min_us: u32, max_us: u32, nominal_us: u32, recovery_us: u32) -> Self {
        Self { min_us, max_us, nominal_us, recovery_us }
    }

    /// Middle of the accepted window.
    #[inline]
    pub const fn midpoint_us(&self) -> u32 {
        (self.min_us + self.max_us) / 2
    }

    #[inline]
    pub const fn accepts(&self, width_us: u32) -> bool {
        width_us >= self.min_us && width_us <= self.max_us
    }

    const fn is_consistent(&self) -> bool {
        self.min_us <= self.nominal_us && self.nominal_us <= self.max_us
    }
}

/// Per-symbol timing of the bus.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingProfile {
    pub brk: SymbolTiming,
    pub wake: SymbolTiming,
    pub zero: SymbolTiming,
    pub one: SymbolTiming,
    /// Recovery after a 0 that ends a byte.
    pub zero_stop_recovery_us: u32,
    /// Recovery after a 1 that ends a byte.
    pub one_stop_recovery_us: u32,
}

impl TimingProfile {
    /// Timing used by Tristar/Hydra hosts.
    pub const DEFAULT: TimingProfile = TimingProfile {
        brk: SymbolTiming::new(12, 16, 14, 5),
        wake: SymbolTiming::new(22, 27, 24, 1100),
        zero: SymbolTiming::new(6, 8, 7, 4),
        one: SymbolTiming::new(1, 3, 2, 9),
        zero_stop_recovery_us: 16,
        one_stop_recovery_us: 21,
    };

    /// Checks the relations the bit decoder depends on:
    /// every nominal inside its window, a 1 strictly shorter than a 0,
    /// windows ordered ONE < ZERO < BREAK < WAKE, and WAKE recovery the
    /// longest recovery.
    pub const fn is_consistent(&self) -> bool {
        self.brk.is_consistent()
            && self.wake.is_consistent()
            && self.zero.is_consistent()
            && self.one.is_consistent()
            && self.one.max_us < self.zero.min_us
            && self.zero.max_us < self.brk.min_us
            && self.brk.max_us < self.wake.min_us
            && self.wake.recovery_us > self.brk.recovery_us
            && self.wake.recovery_us > self.zero.recovery_us
            && self.wake.recovery_us > self.one.recovery_us
            && self.wake.recovery_us > self.zero_stop_recovery_us
            && self.wake.recovery_us > self.one_stop_recovery_us
    }

    /// Timing class of a data bit.
    #[inline]
    pub const fn bit(&self, value: bool) -> &SymbolTiming {
        if value {
            &self.one
        } else {
            &self.zero
        }
    }

    /// Recovery expected after a data bit.
    #[inline]
    pub const fn bit_recovery_us(&self, value: bool, is_last_in_byte: bool) -> u32 {
        match (value, is_last_in_byte) {
            (true, true) => self.one_stop_recovery_us,
            (false, true) => self.zero_stop_recovery_us,
            (true, false) => self.one.recovery_us,
            (false, false) => self.zero.recovery_us,
        }
    }

    /// `(assertion, recovery)` actually driven for a data bit, with the
    /// driver latency taken off both phases.
    #[inline]
    pub const fn driven_bit(&self, value: bool, is_last_in_byte: bool) -> (u32, u32) {
        (
            driven(self.bit(value).nominal_us),
            driven(self.bit_recovery_us(value, is_last_in_byte)),
        )
    }

    /// `(assertion, recovery)` actually driven for a BREAK.
    #[inline]
    pub const fn driven_break(&self) -> (u32, u32) {
        (driven(self.brk.nominal_us), driven(self.brk.recovery_us))
    }
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[inline]
const fn driven(duration_us: u32) -> u32 {
    if duration_us > DRIVE_LATENCY_US {
        duration_us - DRIVE_LATENCY_US
    } else {
        1
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_consistent() {
        assert!(TimingProfile::DEFAULT.is_consistent());
    }

    #[test]
    fn test_one_is_shorter_than_zero() {
        let t = TimingProfile::DEFAULT;
        assert!(t.one.max_us < t.zero.min_us);
        assert!(t.bit(true).nominal_us < t.bit(false).nominal_us);
    }

    #[test]
    fn test_inconsistent_profiles_are_rejected() {
        let mut t = TimingProfile::DEFAULT;
        t.one.nominal_us = 5; // outside [1, 3]
        assert!(!t.is_consistent());

        let mut t = TimingProfile::DEFAULT;
        t.one.max_us = 7; // overlaps the ZERO window
        t.one.nominal_us = 2;
        assert!(!t.is_consistent());

        let mut t = TimingProfile::DEFAULT;
        t.wake.recovery_us = 10; // no longer the wake guard
        assert!(!t.is_consistent());
    }

    #[test]
    fn test_break_window() {
        let brk = TimingProfile::DEFAULT.brk;
        assert!(!brk.accepts(11));
        assert!(brk.accepts(12));
        assert!(brk.accepts(16));
        assert!(!brk.accepts(17));
        assert_eq!(brk.midpoint_us(), 14);
    }

    #[test]
    fn test_stop_recovery_selected_for_last_bit() {
        let t = TimingProfile::DEFAULT;
        assert_eq!(t.bit_recovery_us(true, false), 9);
        assert_eq!(t.bit_recovery_us(true, true), 21);
        assert_eq!(t.bit_recovery_us(false, false), 4);
        assert_eq!(t.bit_recovery_us(false, true), 16);
    }

    #[test]
    fn test_driven_phases_stay_inside_windows() {
        let t = TimingProfile::DEFAULT;
        for value in [true, false] {
            for last in [true, false] {
                let (assert_us, recovery_us) = t.driven_bit(value, last);
                assert!(t.bit(value).accepts(assert_us));
                assert!(recovery_us < t.bit_recovery_us(value, last));
                assert!(recovery_us >= 1);
            }
        }
        let (assert_us, recovery_us) = t.driven_break();
        assert!(t.brk.accepts(assert_us));
        assert_eq!(recovery_us, 4);
    }
}
