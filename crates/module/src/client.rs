//! Light client interface.

use ibc_engine_store::{ReadStore, Store};
use ibc_engine_types::connection::MerklePrefix;
use ibc_engine_types::{BoxError, ClientId, Height};

/// New consensus state recorded by a light client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusStateUpdate {
    pub height: Height,
    /// `keccak256` of the encoded consensus state.
    pub consensus_state_commitment: [u8; 32],
}

/// Outcome of creating or updating a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientUpdate {
    /// `keccak256` of the encoded client state, after the update.
    pub client_state_commitment: [u8; 32],
    /// Consensus states added by the update. A message that only
    /// freezes the client (e.g. misbehaviour) may add none.
    pub consensus_state_updates: Vec<ConsensusStateUpdate>,
}

/// Where and how to verify a counterparty state proof.
#[derive(Copy, Clone, Debug)]
pub struct ProofContext<'a> {
    /// Counterparty height the proof was generated at.
    pub height: Height,
    /// Minimum time, in nanoseconds, that must have passed on this chain
    /// since the consensus state at `height` was recorded.
    pub delay_time_period: u64,
    /// Minimum number of blocks that must have passed on this chain since
    /// the consensus state at `height` was recorded.
    pub delay_block_period: u64,
    pub proof: &'a [u8],
    /// Commitment prefix of the counterparty chain.
    pub prefix: &'a MerklePrefix,
    /// ICS-24 path being proven, e.g. `connections/connection-0`.
    pub path: &'a [u8],
}

/// Light client of some counterparty chain.
///
/// A single deployed light client serves every client of its type; calls
/// are disambiguated by [`ClientId`]. Verification methods return `Ok(false)`
/// when a proof is well-formed but does not hold, and `Err` when it cannot
/// be checked at all (e.g. a missing consensus state).
pub trait LightClient {
    /// Initialize a new client from opaque client and consensus states.
    fn create_client(
        &self,
        store: &mut dyn Store,
        client_id: &ClientId,
        client_state: &[u8],
        consensus_state: &[u8],
    ) -> Result<ClientUpdate, BoxError>;

    /// Process a header, misbehaviour or any other client message.
    fn update_client(
        &self,
        store: &mut dyn Store,
        client_id: &ClientId,
        client_message: &[u8],
    ) -> Result<ClientUpdate, BoxError>;

    /// Latest counterparty height known to the client.
    fn latest_height(&self, store: &dyn ReadStore, client_id: &ClientId)
        -> Result<Height, BoxError>;

    /// Counterparty block timestamp, in nanoseconds, at `height`.
    fn timestamp_at_height(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
        height: Height,
    ) -> Result<u64, BoxError>;

    /// Encoded client state. `None` if the client does not exist.
    fn client_state(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
    ) -> Result<Option<Vec<u8>>, BoxError>;

    /// Encoded consensus state at `height`, if any.
    fn consensus_state(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
        height: Height,
    ) -> Result<Option<Vec<u8>>, BoxError>;

    /// Verify that the counterparty stores `value` at `proof.path`.
    fn verify_membership(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
        proof: ProofContext<'_>,
        value: &[u8],
    ) -> Result<bool, BoxError>;

    /// Verify that the counterparty stores nothing at `proof.path`.
    fn verify_non_membership(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
        proof: ProofContext<'_>,
    ) -> Result<bool, BoxError>;
}
