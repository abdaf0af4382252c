//! Interfaces of the collaborators driven by the IBC core engine.
//!
//! The engine never interprets consensus data nor application payloads.
//! It delegates both to pluggable trait objects, deployed into the host
//! under an [`Address`](ibc_engine_types::Address):
//!
//! - [`LightClient`]s verify headers and state proofs of a counterparty chain.
//! - [`IbcModule`]s are applications bound to ports, which take part in
//!   channel handshakes and consume packets.
//!
//! Both are handed a namespaced slice of the transactional store on every
//! call, and must keep all of their persistent state in it, so that an
//! aborted transaction rolls their state back together with the engine's.

pub mod client;
pub mod module;

#[doc(inline)]
pub use self::client::{ClientUpdate, ConsensusStateUpdate, LightClient, ProofContext};
#[doc(inline)]
pub use self::module::IbcModule;
