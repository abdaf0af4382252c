//! ICS-24 host identifiers.

use std::fmt;
use std::str::FromStr;

use borsh::{io, BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

const CLIENT_ID_LEN: (usize, usize) = (9, 64);
const CONNECTION_ID_LEN: (usize, usize) = (10, 64);
const CHANNEL_ID_LEN: (usize, usize) = (8, 64);
const PORT_ID_LEN: (usize, usize) = (2, 128);
const CLIENT_TYPE_LEN: (usize, usize) = (1, 54);

const CONNECTION_ID_PREFIX: &str = "connection";
const CHANNEL_ID_PREFIX: &str = "channel";

/// Error raised when an identifier violates the ICS-24 rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier {id:?} has length {len}, must be between {min} and {max}")]
    InvalidLength {
        id: String,
        len: usize,
        min: usize,
        max: usize,
    },
    #[error("identifier {id:?} must only contain alphanumerics and `._+-#[]<>`")]
    InvalidCharacter { id: String },
    #[error("identifier {id:?} is not of the form `{prefix}-{{number}}`")]
    InvalidFormat { id: String, prefix: String },
}

/// Check `id` against the ICS-24 character set and the given length bounds.
///
/// The path separator is never part of the allowed character set, which
/// keeps every commitment path injective.
pub fn validate_identifier(id: &str, min: usize, max: usize) -> Result<(), IdentifierError> {
    let len = id.len();
    if len < min || len > max {
        return Err(IdentifierError::InvalidLength {
            id: id.to_owned(),
            len,
            min,
            max,
        });
    }
    let valid_char = |c: char| {
        c.is_ascii_alphanumeric()
            || matches!(c, '.' | '_' | '+' | '-' | '#' | '[' | ']' | '<' | '>')
    };
    if !id.chars().all(valid_char) {
        return Err(IdentifierError::InvalidCharacter { id: id.to_owned() });
    }
    Ok(())
}

fn parse_counter(id: &str, prefix: &str) -> Result<u64, IdentifierError> {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .filter(|n| !n.is_empty() && (n == &"0" || !n.starts_with('0')))
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| IdentifierError::InvalidFormat {
            id: id.to_owned(),
            prefix: prefix.to_owned(),
        })
}

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Debug,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            BorshSerialize,
            Serialize,
            Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl BorshDeserialize for $name {
            fn deserialize_reader<R: io::Read>(reader: &mut R) -> io::Result<Self> {
                String::deserialize_reader(reader)?
                    .parse()
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
            }
        }

        impl $name {
            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }
    };
}

string_identifier! {
    /// Type of a light client, e.g. `07-tendermint` or `tendermint`.
    ClientType
}

string_identifier! {
    /// Identifier of a client, of the form `{clientType}-{n}`.
    ClientId
}

string_identifier! {
    /// Identifier of a connection end, of the form `connection-{n}`.
    ConnectionId
}

string_identifier! {
    /// Identifier of a channel end, of the form `channel-{n}`.
    ChannelId
}

string_identifier! {
    /// Port identifier, bound to exactly one application module.
    PortId
}

impl FromStr for ClientType {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_identifier(s, CLIENT_TYPE_LEN.0, CLIENT_TYPE_LEN.1)?;
        Ok(Self(s.to_owned()))
    }
}

impl ClientType {
    /// Build the `counter`-th client id of this type.
    ///
    /// Fails when the result is not a valid client id, e.g. for short types.
    pub fn client_id(&self, counter: u64) -> Result<ClientId, IdentifierError> {
        format!("{}-{counter}", self.0).parse()
    }
}

impl FromStr for ClientId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_identifier(s, CLIENT_ID_LEN.0, CLIENT_ID_LEN.1)?;
        let (client_type, _) = s.rsplit_once('-').ok_or_else(|| IdentifierError::InvalidFormat {
            id: s.to_owned(),
            prefix: "{clientType}".to_owned(),
        })?;
        parse_counter(s, client_type)?;
        Ok(Self(s.to_owned()))
    }
}

impl ClientId {
    /// Return the client type embedded in this identifier.
    pub fn client_type(&self) -> ClientType {
        let (client_type, _) = self.0.rsplit_once('-').unwrap_or((&self.0, ""));
        ClientType(client_type.to_owned())
    }
}

impl FromStr for ConnectionId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_identifier(s, CONNECTION_ID_LEN.0, CONNECTION_ID_LEN.1)?;
        parse_counter(s, CONNECTION_ID_PREFIX)?;
        Ok(Self(s.to_owned()))
    }
}

impl ConnectionId {
    pub fn new(counter: u64) -> Self {
        Self(format!("{CONNECTION_ID_PREFIX}-{counter}"))
    }
}

impl FromStr for ChannelId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_identifier(s, CHANNEL_ID_LEN.0, CHANNEL_ID_LEN.1)?;
        parse_counter(s, CHANNEL_ID_PREFIX)?;
        Ok(Self(s.to_owned()))
    }
}

impl ChannelId {
    pub fn new(counter: u64) -> Self {
        Self(format!("{CHANNEL_ID_PREFIX}-{counter}"))
    }
}

impl FromStr for PortId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_identifier(s, PORT_ID_LEN.0, PORT_ID_LEN.1)?;
        Ok(Self(s.to_owned()))
    }
}

impl PortId {
    /// The ICS-20 fungible token transfer port.
    pub fn transfer() -> Self {
        Self("transfer".to_owned())
    }
}

/// Packet sequence number. The first packet on a channel has sequence 1.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Sequence(u64);

impl Sequence {
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Return the next sequence, or `None` on overflow.
    pub fn checked_increment(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Encoding of the sequence as published in the commitment store.
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl From<u64> for Sequence {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque address of a caller, application module or light client.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ids_embed_their_type() {
        let client_type: ClientType = "tendermint".parse().unwrap();
        let client_id = client_type.client_id(0).unwrap();

        assert_eq!(client_id.as_str(), "tendermint-0");
        assert_eq!(client_id.client_type(), client_type);
        assert_eq!("tendermint-0".parse::<ClientId>().unwrap(), client_id);
    }

    #[test]
    fn short_client_types_yield_no_client_id() {
        let client_type: ClientType = "mock".parse().unwrap();
        assert!(matches!(
            client_type.client_id(0),
            Err(IdentifierError::InvalidLength { len: 6, .. })
        ));
        assert_eq!(client_type.client_id(10_000).unwrap().as_str(), "mock-10000");
    }

    #[test]
    fn separator_is_rejected() {
        assert!(matches!(
            "trans/fer".parse::<PortId>(),
            Err(IdentifierError::InvalidCharacter { .. })
        ));
        assert!("channel-0/1".parse::<ChannelId>().is_err());
    }

    #[test]
    fn generated_ids_parse_back() {
        assert_eq!(
            ConnectionId::new(42).as_str().parse::<ConnectionId>().unwrap(),
            ConnectionId::new(42)
        );
        assert_eq!(
            ChannelId::new(7).as_str().parse::<ChannelId>().unwrap(),
            ChannelId::new(7)
        );
    }

    #[test]
    fn malformed_ids_are_rejected() {
        for id in ["channel-", "channel-01", "channel-x", "chan-1", "c"] {
            assert!(id.parse::<ChannelId>().is_err(), "{id} should be invalid");
        }
        assert!("connection-".parse::<ConnectionId>().is_err());
        assert!("p".parse::<PortId>().is_err());
    }

    #[test]
    fn borsh_decoding_validates_identifiers() {
        let bytes = borsh::to_vec("a/b").unwrap();
        assert!(borsh::from_slice::<PortId>(&bytes).is_err());

        let bytes = borsh::to_vec("a/channels/channel-1").unwrap();
        assert!(borsh::from_slice::<PortId>(&bytes).is_err());

        let bytes = borsh::to_vec("07-tender/mint").unwrap();
        assert!(borsh::from_slice::<ClientType>(&bytes).is_err());

        let bytes = borsh::to_vec("channel-01").unwrap();
        assert!(borsh::from_slice::<ChannelId>(&bytes).is_err());

        let bytes = borsh::to_vec(&ChannelId::new(3)).unwrap();
        assert_eq!(borsh::from_slice::<ChannelId>(&bytes).unwrap(), ChannelId::new(3));
    }

    #[test]
    fn identifiers_deserialize_with_validation() {
        let port: PortId = serde_json::from_str("\"transfer\"").unwrap();
        assert_eq!(port, PortId::transfer());
        assert!(serde_json::from_str::<ChannelId>("\"channel-\"").is_err());
    }
}
