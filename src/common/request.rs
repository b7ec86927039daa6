// src/common/request.rs

/// Request class, carried in the first byte of every host command.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// `0x74`: the host asks the accessory who it is.
    Poll,
    /// `0x70`: the host asks how much power the accessory wants.
    Power,
    /// `0x76`: seen on the wire, meaning unknown.
    Unknown76,
    /// Anything else.
    Unrecognized(u8),
}

impl Request {
    pub const POLL: u8 = 0x74;
    pub const POWER: u8 = 0x70;
    pub const UNKNOWN_76: u8 = 0x76;

    /// Classifies a request byte.
    pub const fn from_u8(value: u8) -> Self {
        match value {
            Self::POLL => Request::Poll,
            Self::POWER => Request::Power,
            Self::UNKNOWN_76 => Request::Unknown76,
            other => Request::Unrecognized(other),
        }
    }

    /// The request byte as sent on the wire.
    pub const fn as_u8(&self) -> u8 {
        match self {
            Request::Poll => Self::POLL,
            Request::Power => Self::POWER,
            Request::Unknown76 => Self::UNKNOWN_76,
            Request::Unrecognized(other) => *other,
        }
    }
}

impl From<u8> for Request {
    fn from(value: u8) -> Self {
        Request::from_u8(value)
    }
}
