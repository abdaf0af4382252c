//! Messages submitted by relayers and users to drive the handshakes and
//! the packet lifecycle.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::channel::{self, Order};
use crate::connection::{self, Version};
use crate::height::Height;
use crate::identifiers::{Address, ChannelId, ClientId, ClientType, ConnectionId, PortId};
use crate::packet::{Acknowledgement, Packet};

macro_rules! msgs {
    ($($(#[$meta:meta])* pub struct $name:ident { $($body:tt)* })*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
            pub struct $name { $($body)* }
        )*
    };
}

msgs! {
    pub struct MsgCreateClient {
        pub client_type: ClientType,
        /// Opaque to the core, interpreted by the light client.
        pub client_state: Vec<u8>,
        /// Opaque to the core, interpreted by the light client.
        pub consensus_state: Vec<u8>,
    }

    pub struct MsgUpdateClient {
        pub client_id: ClientId,
        /// Header, misbehaviour or any other message the light client accepts.
        pub client_message: Vec<u8>,
    }

    pub struct MsgConnectionOpenInit {
        pub client_id: ClientId,
        pub counterparty: connection::Counterparty,
        /// Restrict the offer to a single supported version.
        pub version: Option<Version>,
        pub delay_period: u64,
    }

    pub struct MsgConnectionOpenTry {
        pub client_id: ClientId,
        pub counterparty: connection::Counterparty,
        pub delay_period: u64,
        /// Client state of this chain, as tracked by the counterparty.
        pub client_state: Vec<u8>,
        pub counterparty_versions: Vec<Version>,
        pub proof_init: Vec<u8>,
        pub proof_client: Vec<u8>,
        pub proof_height: Height,
    }

    pub struct MsgConnectionOpenAck {
        pub connection_id: ConnectionId,
        pub counterparty_connection_id: ConnectionId,
        pub version: Version,
        /// Client state of this chain, as tracked by the counterparty.
        pub client_state: Vec<u8>,
        pub proof_try: Vec<u8>,
        pub proof_client: Vec<u8>,
        pub proof_height: Height,
    }

    pub struct MsgConnectionOpenConfirm {
        pub connection_id: ConnectionId,
        pub proof_ack: Vec<u8>,
        pub proof_height: Height,
    }

    pub struct MsgChannelOpenInit {
        pub port_id: PortId,
        pub ordering: Order,
        pub connection_hops: Vec<ConnectionId>,
        pub counterparty_port_id: PortId,
        /// Version proposed to the module, which has the final say.
        pub version: channel::Version,
    }

    pub struct MsgChannelOpenTry {
        pub port_id: PortId,
        pub ordering: Order,
        pub connection_hops: Vec<ConnectionId>,
        pub counterparty: channel::Counterparty,
        pub counterparty_version: channel::Version,
        pub proof_init: Vec<u8>,
        pub proof_height: Height,
    }

    pub struct MsgChannelOpenAck {
        pub port_id: PortId,
        pub channel_id: ChannelId,
        pub counterparty_channel_id: ChannelId,
        pub counterparty_version: channel::Version,
        pub proof_try: Vec<u8>,
        pub proof_height: Height,
    }

    pub struct MsgChannelOpenConfirm {
        pub port_id: PortId,
        pub channel_id: ChannelId,
        pub proof_ack: Vec<u8>,
        pub proof_height: Height,
    }

    pub struct MsgChannelCloseInit {
        pub port_id: PortId,
        pub channel_id: ChannelId,
    }

    pub struct MsgChannelCloseConfirm {
        pub port_id: PortId,
        pub channel_id: ChannelId,
        pub proof_init: Vec<u8>,
        pub proof_height: Height,
    }

    pub struct MsgRecvPacket {
        pub packet: Packet,
        pub proof_commitment: Vec<u8>,
        pub proof_height: Height,
        pub relayer: Address,
    }

    pub struct MsgAcknowledgement {
        pub packet: Packet,
        pub acknowledgement: Acknowledgement,
        pub proof_acked: Vec<u8>,
        pub proof_height: Height,
        pub relayer: Address,
    }

    pub struct MsgTimeout {
        pub packet: Packet,
        /// Counterparty receive sequence, only relevant for ordered channels.
        pub next_sequence_recv: u64,
        pub proof_unreceived: Vec<u8>,
        pub proof_height: Height,
        pub relayer: Address,
    }
}
