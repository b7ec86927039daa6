// src/common/responses.rs

//! Fixed response frames, checksum excluded.
//!
//! Mode frames share the `0x75` identity header; bytes 1..=3 select the port
//! routing the host should apply.

use super::mode::Mode;

pub const QUERY_SERIAL: &[u8] = &[0x75, 0x60, 0x00, 0x00, 0x00, 0x00, 0x00];
pub const FORCE_RESET: &[u8] = &[0x75, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x00];
pub const DFU: &[u8] = &[0x75, 0x20, 0x00, 0x02, 0x00, 0x00, 0x00];
pub const DIAGNOSTIC_UART: &[u8] = &[0x75, 0x20, 0x00, 0x10, 0x00, 0x00, 0x00];
pub const CHARGING_CABLE: &[u8] = &[0x75, 0x10, 0x0c, 0x00, 0x00, 0x00, 0x00];
pub const JTAG: &[u8] = &[0x75, 0xa0, 0x00, 0x00, 0x00, 0x00, 0x00];
pub const SPAM_JTAG: &[u8] = &[0x75, 0xa0, 0x08, 0x10, 0x00, 0x00, 0x00];

/// Answer to every POWER request, whatever the mode.
pub const POWER_ACK: &[u8] = &[0x71, 0x93];

/// Answer to the `0x76` request, only sent when
/// [`SdqConfig::answer_unknown_76`](crate::SdqConfig) is set.
pub const UNKNOWN_76_ANSWER: &[u8] = &[
    0x77, 0x02, 0x01, 0x02, 0x80, 0x60, 0x01, 0x39, 0x3a, 0x44, 0x3e, 0xc9,
];

/// Property list pushed through the UART bridge once the port is routed to
/// the diagnostic UART in [`Mode::Recovery`].
pub const RECOVERY_PAYLOAD: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\
<plist version=\"1.0\"><dict> <key>Label</key> <string>sdq-accessory</string> \
<key>Request</key> <string>EnterRecovery</string> </dict></plist>";

/// Response frame the accessory answers a POLL with in `mode`.
///
/// Returns `None` for [`Mode::None`], which answers with silence.
/// [`Mode::Recovery`] routes the port like [`Mode::DiagnosticUart`].
pub const fn response_for(mode: Mode) -> Option<&'static [u8]> {
    match mode {
        Mode::None => None,
        Mode::QuerySerial => Some(QUERY_SERIAL),
        Mode::ForceReset => Some(FORCE_RESET),
        Mode::Dfu => Some(DFU),
        Mode::DiagnosticUart | Mode::Recovery => Some(DIAGNOSTIC_UART),
        Mode::ChargingCable => Some(CHARGING_CABLE),
        Mode::Jtag => Some(JTAG),
        Mode::SpamJtag => Some(SPAM_JTAG),
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::frame::MAX_FRAME_LEN;

    #[test]
    fn test_response_for_modes() {
        assert_eq!(response_for(Mode::None), None);
        assert_eq!(response_for(Mode::ForceReset), Some(FORCE_RESET));
        assert_eq!(response_for(Mode::Dfu), Some(DFU));
        assert_eq!(response_for(Mode::Recovery), response_for(Mode::DiagnosticUart));
    }

    #[test]
    fn test_frames_fit_wire_limits() {
        for mode in Mode::ALL {
            if let Some(frame) = response_for(mode) {
                assert!(frame.len() >= 2 && frame.len() <= MAX_FRAME_LEN, "{}", mode);
                assert_eq!(frame[0], 0x75, "{} frame must carry the identity header", mode);
            }
        }
        assert!(POWER_ACK.len() >= 2 && POWER_ACK.len() <= MAX_FRAME_LEN);
        assert!(UNKNOWN_76_ANSWER.len() <= MAX_FRAME_LEN);
    }

    #[test]
    fn test_recovery_payload_is_enter_recovery_plist() {
        assert!(RECOVERY_PAYLOAD.starts_with(b"<?xml"));
        assert!(RECOVERY_PAYLOAD.ends_with(b"</plist>"));
        let needle = b"<string>EnterRecovery</string>";
        assert!(RECOVERY_PAYLOAD.windows(needle.len()).any(|w| w == needle));
    }
}
