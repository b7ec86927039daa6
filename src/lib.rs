// src/lib.rs

//! Accessory-side endpoint for Apple's SDQ single-wire protocol.
//!
//! The crate answers POLL and POWER requests from a dock or Lightning
//! controller with hand-crafted response frames, so a microcontroller can force
//! a device into DFU, reset it, switch its port to the diagnostic UART, or
//! advertise a charging cable. All bit timing is done in software against a
//! free-running cycle counter; there is no UART assisting the bit sampling.
//!
//! The application provides the hardware through [`SdqLine`] and
//! [`CycleCounter`], wraps the resulting [`SdqDevice`] in an [`SdqGateway`],
//! and calls [`SdqGateway::on_edge`] from the pin's edge interrupt.
//!
//! ```ignore
//! let device = SdqDevice::new(line, counter).with_mode(Mode::Dfu);
//! let mut gateway = SdqGateway::new(device);
//! gateway.start();
//! // in the EXTI handler:
//! gateway.on_edge();
//! ```

#![no_std] // Specify no_std at the crate root

#[cfg(feature = "std")]
extern crate std;

pub mod common;
pub mod config;
pub mod device;

#[cfg(any(feature = "impl-bitbang", feature = "cortex-m"))]
pub mod hal;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

// Re-export key types for convenience
pub use common::{CycleCounter, LineMode, Mode, Request, SdqError, SdqLine, TimingProfile};
pub use config::SdqConfig;
pub use device::{
    BusStatus, ResetKind, SdqDevice, SdqGateway, SessionObserver, SessionReport, SessionState,
    UartBridge,
};
