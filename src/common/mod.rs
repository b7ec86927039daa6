// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod crc;
pub mod error;
pub mod frame;
pub mod hal_traits;
pub mod mode;
pub mod request;
pub mod responses;
pub mod timing;

// --- Re-export key types/traits/functions for easier access ---

// From crc.rs
pub use crc::{calculate_crc8, verify_frame_crc8};

// From error.rs
pub use error::SdqError;

// From frame.rs
pub use frame::{Frame, COMMAND_LEN, MAX_FRAME_LEN};

// From hal_traits.rs
pub use hal_traits::{CycleCounter, LineMode, SdqLine};

// From mode.rs
pub use mode::Mode;

// From request.rs
pub use request::Request;

// From responses.rs
pub use responses::response_for;

// From timing.rs (the profile type; constants stay under common::timing::*)
pub use timing::{SymbolTiming, TimingProfile};
