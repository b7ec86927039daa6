// src/common/mode.rs

use core::fmt;

/// The behaviour the accessory impersonates when the host polls it.
///
/// Chosen by the application before [`start`](crate::SdqGateway::start);
/// selects the response frame in [`response_for`](crate::common::response_for).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Listen only; polls are acknowledged by silence.
    #[default]
    None,
    /// Ask for the serial-number accessory identity.
    QuerySerial,
    /// Force the attached device to reboot.
    ForceReset,
    /// Reboot into DFU. Two-phase.
    Dfu,
    /// Route the port to the diagnostic UART (DCSD). Two-phase.
    DiagnosticUart,
    /// Advertise a USB-A charging cable (5V).
    ChargingCable,
    /// Route the port to UART + JTAG. Two-phase.
    Jtag,
    /// Route the port to UART + SWD spam JTAG. Two-phase.
    SpamJtag,
    /// Diagnostic UART, then push the enter-recovery request over the bridge.
    Recovery,
}

impl Mode {
    pub const ALL: [Mode; 9] = [
        Mode::None,
        Mode::QuerySerial,
        Mode::ForceReset,
        Mode::Dfu,
        Mode::DiagnosticUart,
        Mode::ChargingCable,
        Mode::Jtag,
        Mode::SpamJtag,
        Mode::Recovery,
    ];

    /// Modes that need a forced reset acknowledged before their own frame
    /// can be sent.
    #[inline]
    pub const fn is_two_phase(&self) -> bool {
        matches!(self, Mode::Dfu | Mode::DiagnosticUart | Mode::Jtag | Mode::SpamJtag)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::None => "none",
            Mode::QuerySerial => "serial",
            Mode::ForceReset => "reset",
            Mode::Dfu => "dfu",
            Mode::DiagnosticUart => "dcsd",
            Mode::ChargingCable => "charging",
            Mode::Jtag => "jtag",
            Mode::SpamJtag => "spam-jtag",
            Mode::Recovery => "recovery",
        };
        f.write_str(name)
    }
}
