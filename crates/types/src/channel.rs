//! ICS-04 channel ends.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::connection::{ORDER_ORDERED, ORDER_UNORDERED};
use crate::identifiers::{ChannelId, ConnectionId, PortId};

/// State of a [`ChannelEnd`]. `Closed` is terminal.
#[derive(
    Copy,
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelState {
    Uninitialized,
    Init,
    TryOpen,
    Open,
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Init => "INIT",
            Self::TryOpen => "TRYOPEN",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        })
    }
}

/// Packet delivery ordering of a channel, fixed at creation.
#[derive(
    Copy,
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Order {
    Unordered,
    Ordered,
}

impl Order {
    /// Connection version feature that must be present to open a channel
    /// with this ordering.
    pub const fn as_feature(&self) -> &'static str {
        match self {
            Self::Unordered => ORDER_UNORDERED,
            Self::Ordered => ORDER_ORDERED,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_feature())
    }
}

/// Application version string negotiated by the modules on each end.
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
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The remote side of a channel.
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
pub struct Counterparty {
    pub port_id: PortId,
    /// Unknown to the initiator until the counterparty replies with `Try`.
    pub channel_id: Option<ChannelId>,
}

/// ICS-04 channel end, as stored by the host.
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
pub struct ChannelEnd {
    pub state: ChannelState,
    pub ordering: Order,
    pub counterparty: Counterparty,
    /// Always exactly one hop.
    pub connection_hops: Vec<ConnectionId>,
    pub version: Version,
}

impl ChannelEnd {
    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state == ChannelState::Closed
    }

    /// The connection this channel is built on.
    pub fn connection_id(&self) -> Option<&ConnectionId> {
        match self.connection_hops.as_slice() {
            [hop] => Some(hop),
            _ => None,
        }
    }

    /// Whether the given source/destination pair is this channel's counterparty.
    pub fn counterparty_matches(&self, port_id: &PortId, channel_id: &ChannelId) -> bool {
        &self.counterparty.port_id == port_id
            && self.counterparty.channel_id.as_ref() == Some(channel_id)
    }

    /// Encoding committed to the host's commitment store, and expected
    /// from the counterparty during proof verification.
    pub fn encode(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }
}
