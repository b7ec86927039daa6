// src/common/hal_traits.rs

/// Pin configurations the protocol moves the SDQ line through.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineMode {
    /// Driven by the accessory during a session. Released means high (pull-up).
    OutputOpenDrain,
    /// Input with interrupts on both edges; the idle, armed state.
    InterruptBothEdges,
    /// High impedance with interrupts removed; the stopped state.
    Analog,
}

/// Abstraction for the single GPIO line the SDQ bus runs on.
///
/// Implementations must be cheap: `is_high` sits in the innermost timing loop
/// and is polled every few cycles.
pub trait SdqLine {
    /// Reads the current line level. Valid in every mode.
    fn is_high(&mut self) -> bool;

    /// Releases the line (output high). Only meaningful in output mode.
    fn set_high(&mut self);

    /// Pulls the line low. Only meaningful in output mode.
    fn set_low(&mut self);

    /// Reconfigures the pin. Switching to [`LineMode::InterruptBothEdges`]
    /// must (re)enable the edge interrupt; leaving it must disable it. A line
    /// that cannot reach the interrupt controller must make the mode
    /// readable so the application can do it.
    fn set_mode(&mut self, mode: LineMode);
}

/// Abstraction for the free-running cycle counter all timing is measured on.
pub trait CycleCounter {
    /// Current counter value. Expected to wrap at `u32::MAX`.
    fn now(&self) -> u32;

    /// Counter ticks per microsecond.
    fn cycles_per_us(&self) -> u32;
}
