//! Built-in packet type tags.
//!
//! The frame layer carries the type byte without interpreting it. These are
//! the tags used by the reference firmware and host tooling; applications
//! may use any other value.

/// Acknowledgement.
pub const ACK: u8 = 0;

/// Publish data to the peer.
pub const PUBLISH: u8 = 1;

/// Subscribe to a data stream.
pub const SUBSCRIBE: u8 = 2;

/// Known packet types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Ack = ACK,
    Publish = PUBLISH,
    Subscribe = SUBSCRIBE,
}

impl PacketType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            PacketType::Ack => "ACK",
            PacketType::Publish => "PUBLISH",
            PacketType::Subscribe => "SUBSCRIBE",
        }
    }
}

impl TryFrom<u8> for PacketType {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            ACK => Ok(PacketType::Ack),
            PUBLISH => Ok(PacketType::Publish),
            SUBSCRIBE => Ok(PacketType::Subscribe),
            other => Err(other),
        }
    }
}

impl From<PacketType> for u8 {
    fn from(value: PacketType) -> Self {
        value.as_u8()
    }
}

/// Human-readable name for a type byte.
pub fn type_name(value: u8) -> &'static str {
    PacketType::try_from(value)
        .map(PacketType::name)
        .unwrap_or("USER")
}

/// True for the tags listed in [`PacketType`].
pub fn is_builtin(value: u8) -> bool {
    PacketType::try_from(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_known_tags() {
        assert_eq!(PacketType::try_from(0), Ok(PacketType::Ack));
        assert_eq!(PacketType::try_from(1), Ok(PacketType::Publish));
        assert_eq!(PacketType::try_from(2), Ok(PacketType::Subscribe));
        assert_eq!(PacketType::try_from(7), Err(7));
        assert_eq!(u8::from(PacketType::Subscribe), 2);
    }

    #[test]
    fn names_fall_back_to_user() {
        assert_eq!(type_name(PUBLISH), "PUBLISH");
        assert_eq!(type_name(0x42), "USER");
        assert!(is_builtin(ACK));
        assert!(!is_builtin(0x42));
    }
}
