//! Error taxonomy of the IBC core engine.
//!
//! Every error aborts the transaction it was raised in. Callers observe a
//! single failure, classified by [`ErrorKind`].

use crate::channel::ChannelState;
use crate::connection::ConnectionState;
use crate::height::Height;
use crate::identifiers::{
    Address, ChannelId, ClientId, ClientType, ConnectionId, IdentifierError, PortId, Sequence,
};
use crate::BoxError;

/// Coarse classification of an [`IbcError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An object was in the wrong state, or a caller lacked authority.
    PreconditionViolation,
    /// A light client rejected a membership or non-membership proof.
    ProofVerificationFailure,
    /// A client, connection, channel, port, capability or commitment
    /// already exists.
    IdentifierConflict,
    /// A client, connection, channel, module or commitment is unknown.
    NotFound,
    /// An out-of-order or replayed packet sequence.
    SequenceViolation,
    /// Malformed input, such as an invalid identifier or undecodable record.
    InvalidInput,
    /// The underlying store failed.
    Storage,
    /// A light client or application module failed.
    Application,
}

#[derive(Debug, thiserror::Error)]
pub enum IbcError {
    // --- precondition violations ---
    #[error("caller {caller} is not authorized to {action}")]
    Unauthorized { caller: Address, action: &'static str },
    #[error("capability {name} is not owned by {caller}")]
    CapabilityNotOwned { name: String, caller: Address },
    #[error("connection {connection_id} is in state {actual}, expected {expected}")]
    InvalidConnectionState {
        connection_id: ConnectionId,
        expected: ConnectionState,
        actual: ConnectionState,
    },
    #[error("channel {port_id}/{channel_id} is in state {actual}, expected {expected}")]
    InvalidChannelState {
        port_id: PortId,
        channel_id: ChannelId,
        expected: ChannelState,
        actual: ChannelState,
    },
    #[error("counterparty connection id must be empty when initializing a connection")]
    CounterpartyConnectionIdSet,
    #[error("counterparty {what} is missing")]
    MissingCounterpartyId { what: &'static str },
    #[error("version {version} is not supported")]
    UnsupportedVersion { version: String },
    #[error("counterparty versions must not be empty")]
    EmptyCounterpartyVersions,
    #[error("no common version with counterparty")]
    NoCommonVersion,
    #[error("ordering {ordering} is not supported by connection {connection_id}")]
    UnsupportedOrdering {
        ordering: String,
        connection_id: ConnectionId,
    },
    #[error("channels must have exactly one connection hop, got {hops}")]
    InvalidConnectionHops { hops: usize },
    #[error("proof height {proof_height} is above latest client height {latest_height}")]
    ProofHeightTooHigh {
        proof_height: Height,
        latest_height: Height,
    },
    #[error("packet destination/source does not match the channel counterparty")]
    CounterpartyMismatch,
    #[error("packet must set at least one of timeout height or timeout timestamp")]
    MissingTimeout,
    #[error("packet {sequence} has timed out")]
    PacketTimedOut { sequence: Sequence },
    #[error("packet {sequence} has not timed out yet")]
    PacketNotTimedOut { sequence: Sequence },
    #[error("packet {sequence} does not match its stored commitment")]
    PacketCommitmentMismatch { sequence: Sequence },
    #[error("packet {sequence} was already received by the counterparty")]
    PacketAlreadyRelayed { sequence: Sequence },
    #[error("packet {sequence} has not been received")]
    PacketNotReceived { sequence: Sequence },
    #[error("acknowledgement must not be empty")]
    EmptyAcknowledgement,

    // --- proof verification ---
    #[error("proof verification failed for path {path}")]
    ProofVerificationFailed {
        path: String,
        #[source]
        reason: Option<BoxError>,
    },

    // --- identifier conflicts ---
    #[error("port {port_id} is already bound")]
    PortAlreadyBound { port_id: PortId },
    #[error("capability {name} is already claimed")]
    CapabilityAlreadyClaimed { name: String },
    #[error("client {client_id} already exists")]
    ClientAlreadyExists { client_id: ClientId },
    #[error("connection {connection_id} already exists")]
    ConnectionAlreadyExists { connection_id: ConnectionId },
    #[error("channel {port_id}/{channel_id} already exists")]
    ChannelAlreadyExists {
        port_id: PortId,
        channel_id: ChannelId,
    },
    #[error("packet commitment for sequence {sequence} already exists")]
    PacketCommitmentExists { sequence: Sequence },
    #[error("acknowledgement for sequence {sequence} already exists")]
    AcknowledgementExists { sequence: Sequence },

    // --- not found ---
    #[error("no light client is registered for client type {client_type}")]
    UnknownClientType { client_type: ClientType },
    #[error("no light client is deployed at {address}")]
    LightClientNotFound { address: Address },
    #[error("client {client_id} not found")]
    ClientNotFound { client_id: ClientId },
    #[error("connection {connection_id} not found")]
    ConnectionNotFound { connection_id: ConnectionId },
    #[error("channel {port_id}/{channel_id} not found")]
    ChannelNotFound {
        port_id: PortId,
        channel_id: ChannelId,
    },
    #[error("no module found for {name}")]
    ModuleNotFound { name: String },
    #[error("packet commitment for sequence {sequence} not found")]
    PacketCommitmentNotFound { sequence: Sequence },

    // --- sequence violations ---
    #[error("invalid packet sequence {actual}, expected {expected}")]
    InvalidPacketSequence { expected: Sequence, actual: Sequence },
    #[error("packet {sequence} was already received")]
    PacketAlreadyReceived { sequence: Sequence },
    #[error("sequence counter overflowed")]
    SequenceOverflow,

    // --- invalid input ---
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    // --- collaborators ---
    #[error("store error: {0}")]
    Store(#[source] BoxError),
    #[error("light client error: {0}")]
    LightClient(#[source] BoxError),
    #[error("module {module} error: {reason}")]
    Module {
        module: Address,
        #[source]
        reason: BoxError,
    },
}

impl IbcError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        use IbcError::*;

        match self {
            Unauthorized { .. }
            | CapabilityNotOwned { .. }
            | InvalidConnectionState { .. }
            | InvalidChannelState { .. }
            | CounterpartyConnectionIdSet
            | MissingCounterpartyId { .. }
            | UnsupportedVersion { .. }
            | EmptyCounterpartyVersions
            | NoCommonVersion
            | UnsupportedOrdering { .. }
            | InvalidConnectionHops { .. }
            | ProofHeightTooHigh { .. }
            | CounterpartyMismatch
            | MissingTimeout
            | PacketTimedOut { .. }
            | PacketNotTimedOut { .. }
            | PacketCommitmentMismatch { .. }
            | PacketAlreadyRelayed { .. }
            | PacketNotReceived { .. }
            | EmptyAcknowledgement => ErrorKind::PreconditionViolation,
            ProofVerificationFailed { .. } => ErrorKind::ProofVerificationFailure,
            PortAlreadyBound { .. }
            | CapabilityAlreadyClaimed { .. }
            | ClientAlreadyExists { .. }
            | ConnectionAlreadyExists { .. }
            | ChannelAlreadyExists { .. }
            | PacketCommitmentExists { .. }
            | AcknowledgementExists { .. } => ErrorKind::IdentifierConflict,
            UnknownClientType { .. }
            | LightClientNotFound { .. }
            | ClientNotFound { .. }
            | ConnectionNotFound { .. }
            | ChannelNotFound { .. }
            | ModuleNotFound { .. }
            | PacketCommitmentNotFound { .. } => ErrorKind::NotFound,
            InvalidPacketSequence { .. } | PacketAlreadyReceived { .. } | SequenceOverflow => {
                ErrorKind::SequenceViolation
            }
            Identifier(_) | Decode { .. } => ErrorKind::InvalidInput,
            Store(_) => ErrorKind::Storage,
            LightClient(_) | Module { .. } => ErrorKind::Application,
        }
    }

    pub fn proof_failed(path: impl ToString) -> Self {
        Self::ProofVerificationFailed {
            path: path.to_string(),
            reason: None,
        }
    }
}
