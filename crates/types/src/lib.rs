//! Protocol objects of the IBC core engine.
//!
//! This crate defines the identifiers, heights, connection and channel
//! ends, packets and relayer messages shared by every layer of the engine,
//! along with the engine's error taxonomy.

pub mod channel;
pub mod connection;
pub mod error;
pub mod height;
pub mod identifiers;
pub mod msgs;
pub mod packet;

#[doc(inline)]
pub use self::error::{ErrorKind, IbcError};
#[doc(inline)]
pub use self::height::Height;
#[doc(inline)]
pub use self::identifiers::{
    Address, ChannelId, ClientId, ClientType, ConnectionId, IdentifierError, PortId, Sequence,
};
#[doc(inline)]
pub use self::packet::{Acknowledgement, Packet};

/// Boxed error returned by pluggable collaborators (stores, light
/// clients and application modules).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
