// src/hal.rs

//! Adapters from common HAL types to [`SdqLine`](crate::SdqLine) and
//! [`CycleCounter`](crate::CycleCounter).

#[cfg(feature = "impl-bitbang")]
pub use bitbang::OpenDrainPin;

#[cfg(feature = "cortex-m")]
pub use dwt::DwtCounter;

#[cfg(feature = "impl-bitbang")]
mod bitbang {
    use crate::common::{LineMode, SdqLine};
    use embedded_hal::digital::{InputPin, OutputPin};

    /// Any embedded-hal v1 pin configured as open-drain output with input
    /// readback.
    ///
    /// Pin errors are ignored; a failed read counts as released.
    ///
    /// embedded-hal has no interrupt API, so the edge interrupt is switched
    /// through a hook: `irq(true)` when the line is armed, `irq(false)` when
    /// it leaves [`LineMode::InterruptBothEdges`]. Built with
    /// [`OpenDrainPin::new`] the hook does nothing and the adapter is input
    /// and output only; the application then follows [`OpenDrainPin::mode`].
    pub struct OpenDrainPin<P, F = fn(bool)> {
        pin: P,
        irq: F,
        mode: LineMode,
    }

    fn no_interrupt(_enable: bool) {}

    impl<P> OpenDrainPin<P>
    where
        P: InputPin + OutputPin,
    {
        pub fn new(pin: P) -> Self {
            Self::with_interrupt(pin, no_interrupt)
        }
    }

    impl<P, F> OpenDrainPin<P, F>
    where
        P: InputPin + OutputPin,
        F: FnMut(bool),
    {
        /// `irq` enables (`true`) or disables (`false`) the pin's both-edge
        /// interrupt.
        pub fn with_interrupt(pin: P, irq: F) -> Self {
            OpenDrainPin { pin, irq, mode: LineMode::Analog }
        }

        pub fn mode(&self) -> LineMode {
            self.mode
        }

        pub fn free(self) -> P {
            self.pin
        }
    }

    impl<P, F> SdqLine for OpenDrainPin<P, F>
    where
        P: InputPin + OutputPin,
        F: FnMut(bool),
    {
        fn is_high(&mut self) -> bool {
            self.pin.is_high().unwrap_or(true)
        }

        fn set_high(&mut self) {
            let _ = self.pin.set_high();
        }

        fn set_low(&mut self) {
            if self.mode == LineMode::OutputOpenDrain {
                let _ = self.pin.set_low();
            }
        }

        fn set_mode(&mut self, mode: LineMode) {
            if mode != LineMode::OutputOpenDrain {
                let _ = self.pin.set_high();
            }
            let armed = mode == LineMode::InterruptBothEdges;
            if armed != (self.mode == LineMode::InterruptBothEdges) {
                (self.irq)(armed);
            }
            self.mode = mode;
        }
    }

    // --- Unit Tests ---
    #[cfg(test)]
    mod tests {
        extern crate std;

        use super::*;
        use core::cell::RefCell;
        use core::convert::Infallible;
        use embedded_hal::digital::ErrorType;
        use std::vec::Vec;

        /// Open-drain pin with an external pull-up: reads back what it drives.
        #[derive(Default)]
        struct MockPin {
            low: bool,
            writes: Vec<bool>,
        }

        impl ErrorType for MockPin {
            type Error = Infallible;
        }

        impl InputPin for MockPin {
            fn is_high(&mut self) -> Result<bool, Infallible> {
                Ok(!self.low)
            }

            fn is_low(&mut self) -> Result<bool, Infallible> {
                Ok(self.low)
            }
        }

        impl OutputPin for MockPin {
            fn set_low(&mut self) -> Result<(), Infallible> {
                self.low = true;
                self.writes.push(false);
                Ok(())
            }

            fn set_high(&mut self) -> Result<(), Infallible> {
                self.low = false;
                self.writes.push(true);
                Ok(())
            }
        }

        #[test]
        fn test_set_low_only_drives_in_output_mode() {
            let mut line = OpenDrainPin::new(MockPin::default());
            line.set_low();
            assert!(line.is_high());

            line.set_mode(LineMode::OutputOpenDrain);
            line.set_low();
            assert!(!line.is_high());
            line.set_high();
            assert!(line.is_high());
            assert_eq!(line.free().writes, [false, true]);
        }

        #[test]
        fn test_leaving_output_releases_line() {
            let mut line = OpenDrainPin::new(MockPin::default());
            line.set_mode(LineMode::OutputOpenDrain);
            line.set_low();
            line.set_mode(LineMode::InterruptBothEdges);
            assert!(line.is_high());
            assert_eq!(line.mode(), LineMode::InterruptBothEdges);
        }

        #[test]
        fn test_interrupt_hook_follows_armed_mode() {
            let calls = RefCell::new(Vec::new());
            let mut line = OpenDrainPin::with_interrupt(MockPin::default(), |on| calls.borrow_mut().push(on));

            line.set_mode(LineMode::InterruptBothEdges);
            line.set_mode(LineMode::InterruptBothEdges);
            line.set_mode(LineMode::OutputOpenDrain);
            line.set_mode(LineMode::Analog);
            line.set_mode(LineMode::InterruptBothEdges);
            line.set_mode(LineMode::Analog);
            drop(line);

            assert_eq!(calls.into_inner(), [true, false, true, false]);
        }
    }
}

#[cfg(feature = "cortex-m")]
mod dwt {
    use crate::common::CycleCounter;
    use cortex_m::peripheral::{DCB, DWT};

    /// The Cortex-M DWT cycle counter.
    #[derive(Debug, Copy, Clone)]
    pub struct DwtCounter {
        cycles_per_us: u32,
    }

    impl DwtCounter {
        /// Enables the counter and takes ownership of `DWT`. `core_clock_hz`
        /// is the CPU clock.
        pub fn new(mut dwt: DWT, dcb: &mut DCB, core_clock_hz: u32) -> Self {
            dcb.enable_trace();
            dwt.enable_cycle_counter();
            DwtCounter { cycles_per_us: (core_clock_hz / 1_000_000).max(1) }
        }
    }

    impl CycleCounter for DwtCounter {
        #[inline]
        fn now(&self) -> u32 {
            DWT::cycle_count()
        }

        #[inline]
        fn cycles_per_us(&self) -> u32 {
            self.cycles_per_us
        }
    }
}
