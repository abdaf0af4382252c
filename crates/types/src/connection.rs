//! ICS-03 connection ends.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::identifiers::{ClientId, ConnectionId};

/// Feature advertising support for ordered channels.
pub const ORDER_ORDERED: &str = "ORDER_ORDERED";
/// Feature advertising support for unordered channels.
pub const ORDER_UNORDERED: &str = "ORDER_UNORDERED";

/// State of a [`ConnectionEnd`].
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
pub enum ConnectionState {
    Uninitialized,
    Init,
    TryOpen,
    Open,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Init => "INIT",
            Self::TryOpen => "TRYOPEN",
            Self::Open => "OPEN",
        })
    }
}

/// Key prefix under which a chain stores its IBC commitments.
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
pub struct MerklePrefix {
    pub key_prefix: Vec<u8>,
}

impl MerklePrefix {
    pub fn new(key_prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key_prefix
    }
}

/// Connection version: an identifier plus the channel orderings it supports.
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
pub struct Version {
    pub identifier: String,
    pub features: Vec<String>,
}

impl Version {
    pub fn new(identifier: impl Into<String>, features: Vec<String>) -> Self {
        Self {
            identifier: identifier.into(),
            features,
        }
    }

    /// Whether `feature` is advertised by this version.
    pub fn supports_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// Whether this version is a non-empty restriction of `offered`: same
    /// identifier, and only features `offered` advertises.
    pub fn narrows(&self, offered: &Version) -> bool {
        self.identifier == offered.identifier
            && !self.features.is_empty()
            && self.features.iter().all(|f| offered.supports_feature(f))
    }
}

impl Default for Version {
    /// The IBC version `1`, supporting both channel orderings.
    fn default() -> Self {
        Self::new(
            "1",
            vec![ORDER_ORDERED.to_owned(), ORDER_UNORDERED.to_owned()],
        )
    }
}

/// Negotiate a version from the counterparty's offer.
///
/// Takes the first of `supported` whose identifier the counterparty also
/// offers, keeping only the features both sides advertise. Candidates without
/// a common feature are skipped.
pub fn pick_version(supported: &[Version], counterparty: &[Version]) -> Option<Version> {
    supported.iter().find_map(|ours| {
        let theirs = counterparty
            .iter()
            .find(|theirs| theirs.identifier == ours.identifier)?;
        let features: Vec<String> = ours
            .features
            .iter()
            .filter(|feature| theirs.supports_feature(feature))
            .cloned()
            .collect();
        (!features.is_empty()).then(|| Version::new(ours.identifier.clone(), features))
    })
}

/// The remote side of a connection.
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
    pub client_id: ClientId,
    /// Unknown to the initiator until the counterparty replies with `Try`.
    pub connection_id: Option<ConnectionId>,
    pub prefix: MerklePrefix,
}

/// ICS-03 connection end, as stored by the host.
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
pub struct ConnectionEnd {
    pub client_id: ClientId,
    pub counterparty: Counterparty,
    pub versions: Vec<Version>,
    pub state: ConnectionState,
    /// Delay period in nanoseconds applied to packet proofs.
    pub delay_period: u64,
}

impl ConnectionEnd {
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Encoding committed to the host's commitment store, and expected
    /// from the counterparty during proof verification.
    pub fn encode(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }
}
