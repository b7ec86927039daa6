// src/config.rs

use crate::common::timing::{self, TimingProfile};

/// Run-time settings of an [`SdqDevice`](crate::SdqDevice).
///
/// Everything here has a compiled-in default; nothing is persisted.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SdqConfig {
    /// Symbol timing of the bus.
    pub timing: TimingProfile,
    /// How long a connected session waits for the host's next break.
    pub idle_timeout_us: u32,
    /// How long the UART bridge may take to accept the recovery payload.
    pub bridge_timeout_us: u32,
    /// Answer `0x76` requests instead of staying silent. The right answer is
    /// unconfirmed on hardware, so this is off by default.
    pub answer_unknown_76: bool,
}

impl SdqConfig {
    pub const DEFAULT: SdqConfig = SdqConfig {
        timing: TimingProfile::DEFAULT,
        idle_timeout_us: timing::IDLE_TIMEOUT_US,
        bridge_timeout_us: timing::BRIDGE_TIMEOUT_US,
        answer_unknown_76: false,
    };

    /// Replaces the symbol timing. The windows must not overlap; see
    /// [`TimingProfile::is_consistent`].
    pub const fn with_timing(mut self, timing: TimingProfile) -> Self {
        debug_assert!(timing.is_consistent(), "overlapping SDQ timing windows");
        self.timing = timing;
        self
    }

    pub const fn with_idle_timeout_us(mut self, us: u32) -> Self {
        self.idle_timeout_us = us;
        self
    }

    pub const fn with_bridge_timeout_us(mut self, us: u32) -> Self {
        self.bridge_timeout_us = us;
        self
    }

    pub const fn with_answer_unknown_76(mut self, answer: bool) -> Self {
        self.answer_unknown_76 = answer;
        self
    }
}

impl Default for SdqConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SdqConfig::default();
        assert_eq!(config.timing, TimingProfile::DEFAULT);
        assert_eq!(config.idle_timeout_us, 15_000);
        assert!(!config.answer_unknown_76);
    }

    #[test]
    fn test_builders() {
        let config = SdqConfig::default()
            .with_idle_timeout_us(2_000)
            .with_bridge_timeout_us(10)
            .with_answer_unknown_76(true);
        assert_eq!(config.idle_timeout_us, 2_000);
        assert_eq!(config.bridge_timeout_us, 10);
        assert!(config.answer_unknown_76);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "overlapping SDQ timing windows")]
    fn test_with_timing_rejects_overlapping_windows() {
        let mut timing = TimingProfile::DEFAULT;
        timing.one.max_us = timing.zero.max_us + 1;
        let _ = SdqConfig::default().with_timing(timing);
    }
}
