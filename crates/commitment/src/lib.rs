//! ICS-24 commitment paths and the hashes published under them.
//!
//! Every protocol object a counterparty may want to prove lives at a
//! canonical ASCII path. The host stores `keccak256(value)` under the key
//! `keccak256(path)` in a flat commitment store.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod path;

use alloc::string::ToString;
use alloc::vec::Vec;

use ibc_engine_types::{Acknowledgement, Packet};
use sha3::{Digest, Keccak256};

#[doc(inline)]
pub use self::path::Path;

/// Output of the commitment hash function.
pub type Hash = [u8; 32];

/// Marker stored for packet receipts. Receipts carry no payload.
pub const RECEIPT_MARKER: &[u8] = &[1];

/// Hash some bytes with keccak-256.
pub fn keccak256(bytes: &[u8]) -> Hash {
    Keccak256::digest(bytes).into()
}

/// Commitment store key of `path`.
pub fn commitment_key(path: &Path) -> Hash {
    keccak256(path.to_string().as_bytes())
}

/// Value whose hash is committed for `packet`:
/// `timeout_height ‖ timeout_timestamp ‖ keccak256(data)`, with the height
/// revision number and revision height and the timestamp as big-endian u64.
pub fn packet_commitment_bytes(packet: &Packet) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 * 3 + 32);
    bytes.extend_from_slice(&packet.timeout_height.revision_number.to_be_bytes());
    bytes.extend_from_slice(&packet.timeout_height.revision_height.to_be_bytes());
    bytes.extend_from_slice(&packet.timeout_timestamp.to_be_bytes());
    bytes.extend_from_slice(&keccak256(&packet.data));
    bytes
}

/// Commitment stored under the packet's commitment path.
pub fn packet_commitment(packet: &Packet) -> Hash {
    keccak256(&packet_commitment_bytes(packet))
}

/// Commitment stored under the acknowledgement path.
pub fn ack_commitment(ack: &Acknowledgement) -> Hash {
    keccak256(ack.as_bytes())
}
