//! IBC core protocol engine.
//!
//! [`IbcHost`] owns a key-value store and drives the ICS-02 client
//! registry, the ICS-03 connection and ICS-04 channel handshakes, and the
//! ICS-04 packet lifecycle over it. Light clients and application modules
//! are deployed into the host as trait objects, and called back with a
//! namespaced slice of the host's store.
//!
//! Each state-changing call is one transaction. Its writes are buffered,
//! and only reach the host's store if every check along the way passed.

pub mod capability;
pub mod channel;
pub mod client;
pub mod config;
pub mod connection;
pub mod context;
pub mod events;
pub mod host;
pub mod packet;
pub mod state;

#[doc(inline)]
pub use ibc_engine_module::{IbcModule, LightClient};
#[doc(inline)]
pub use ibc_engine_types::{ErrorKind, IbcError};

#[doc(inline)]
pub use self::client::ClientRecord;
#[doc(inline)]
pub use self::config::HostConfig;
#[doc(inline)]
pub use self::context::{BlockInfo, Context};
#[doc(inline)]
pub use self::events::IbcEvent;
#[doc(inline)]
pub use self::host::IbcHost;
