use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::height::Height;
use crate::identifiers::{ChannelId, PortId, Sequence};

/// ICS-04 packet.
///
/// Packets are never persisted by the host. Only a commitment to the
/// timeouts and data is stored, keyed by source port, channel and sequence.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Packet {
    pub sequence: Sequence,
    pub source_port: PortId,
    pub source_channel: ChannelId,
    pub destination_port: PortId,
    pub destination_channel: ChannelId,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    /// Zero disables the height based timeout.
    pub timeout_height: Height,
    /// Unix time in nanoseconds. Zero disables the timestamp based timeout.
    pub timeout_timestamp: u64,
}

impl Packet {
    /// Whether at least one of the timeouts is set.
    pub fn has_timeout(&self) -> bool {
        !self.timeout_height.is_zero() || self.timeout_timestamp != 0
    }

    /// Whether the packet has timed out on a chain at `height` and `timestamp`.
    pub fn timed_out_at(&self, height: Height, timestamp: u64) -> bool {
        let height_passed = !self.timeout_height.is_zero() && height >= self.timeout_height;
        let time_passed = self.timeout_timestamp != 0 && timestamp >= self.timeout_timestamp;
        height_passed || time_passed
    }
}

/// Acknowledgement written by the receiving module. An empty acknowledgement
/// means the module will write it asynchronously.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Acknowledgement(#[serde(with = "hex_bytes")] Vec<u8>);

impl Acknowledgement {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Acknowledgement {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Acknowledgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
