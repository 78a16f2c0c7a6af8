//! GATT layout of the robot.
//!
//! The radio stack owns the services; this module only names them so a
//! host can build its GATT table and route characteristic events into a
//! [`Link`](crate::Link).

use crate::transport::Channel;

/// Primary service advertised by the robot.
pub const SERVICE_UUID: &str = "799d5f0d-0000-0000-a6a2-da053e2a640a";

/// Configuration service.
pub const CONFIG_SERVICE_UUID: &str = "799d5f0d-0001-0000-a6a2-da053e2a640a";

/// Service carrying the four command characteristics.
pub const COMMAND_SERVICE_UUID: &str = "799d5f0d-0002-0000-a6a2-da053e2a640a";

/// What a client may do with a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Write,
    Notify,
}

/// The characteristics of the command service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    /// Fire-and-forget commands.
    Command,
    /// Commands answered on [`Characteristic::Response`].
    Request,
    /// Chunked, terminated replies.
    Response,
    /// Speech-to-text stream.
    Listen,
}

impl Characteristic {
    pub const ALL: [Characteristic; 4] = [
        Characteristic::Command,
        Characteristic::Request,
        Characteristic::Response,
        Characteristic::Listen,
    ];

    pub fn uuid(&self) -> &'static str {
        match self {
            Self::Command => "799d5f0d-0002-0001-a6a2-da053e2a640a",
            Self::Request => "799d5f0d-0002-0002-a6a2-da053e2a640a",
            Self::Response => "799d5f0d-0002-0003-a6a2-da053e2a640a",
            Self::Listen => "799d5f0d-0002-0004-a6a2-da053e2a640a",
        }
    }

    /// 16-bit UUID of the user-description descriptor.
    pub fn descriptor_uuid(&self) -> &'static str {
        match self {
            Self::Command => "0201",
            Self::Request => "0202",
            Self::Response => "0203",
            Self::Listen => "0204",
        }
    }

    /// User-description text.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Command => "TJBot Command channel for sending commands with no response",
            Self::Request => "TJBot Request channel for making requests with responses",
            Self::Response => "TJBot Response channel for receiving data from a request",
            Self::Listen => "TJBot Listen channel for receiving STT data stream",
        }
    }

    pub fn properties(&self) -> &'static [Property] {
        match self {
            Self::Command | Self::Request => &[Property::Write],
            Self::Response | Self::Listen => &[Property::Notify],
        }
    }

    /// The inbound channel writes to this characteristic feed, if writable.
    pub fn write_channel(&self) -> Option<Channel> {
        match self {
            Self::Command => Some(Channel::Command),
            Self::Request => Some(Channel::Request),
            Self::Response | Self::Listen => None,
        }
    }

    /// Look a characteristic up by UUID.
    ///
    /// Case and dashes are ignored, so the compact form radio stacks often
    /// report matches too.
    pub fn from_uuid(uuid: &str) -> Option<Self> {
        let wanted = normalize(uuid);
        Self::ALL
            .into_iter()
            .find(|c| normalize(c.uuid()) == wanted)
    }
}

impl std::fmt::Display for Characteristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Command => "command",
            Self::Request => "request",
            Self::Response => "response",
            Self::Listen => "listen",
        };
        f.write_str(name)
    }
}

fn normalize(uuid: &str) -> String {
    uuid.chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uuid() {
        assert_eq!(
            Characteristic::from_uuid("799d5f0d-0002-0002-a6a2-da053e2a640a"),
            Some(Characteristic::Request)
        );
        assert_eq!(
            Characteristic::from_uuid("799D5F0D00020004A6A2DA053E2A640A"),
            Some(Characteristic::Listen)
        );
        assert_eq!(Characteristic::from_uuid(SERVICE_UUID), None);
    }

    #[test]
    fn test_every_characteristic_is_in_the_command_service() {
        for c in Characteristic::ALL {
            assert!(c.uuid().starts_with("799d5f0d-0002-"));
            assert!(c.description().starts_with("TJBot "));
        }
    }

    #[test]
    fn test_descriptor_uuids_are_short() {
        let uuids: Vec<&str> = Characteristic::ALL
            .iter()
            .map(|c| c.descriptor_uuid())
            .collect();
        assert_eq!(uuids, ["0201", "0202", "0203", "0204"]);
    }

    #[test]
    fn test_write_channels() {
        assert_eq!(Characteristic::Command.write_channel(), Some(Channel::Command));
        assert_eq!(Characteristic::Request.write_channel(), Some(Channel::Request));
        assert_eq!(Characteristic::Response.write_channel(), None);
        assert_eq!(Characteristic::Listen.properties(), &[Property::Notify]);
    }
}
