//! Events emitted by successful transactions.

use ibc_engine_types::channel::{Order, Version};
use ibc_engine_types::{
    Acknowledgement, Address, ChannelId, ClientId, ClientType, ConnectionId, Height, Packet,
    PortId, Sequence,
};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConnectionAttributes {
    pub connection_id: ConnectionId,
    pub client_id: ClientId,
    pub counterparty_client_id: ClientId,
    pub counterparty_connection_id: Option<ConnectionId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelAttributes {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub counterparty_port_id: PortId,
    pub counterparty_channel_id: Option<ChannelId>,
    pub connection_id: ConnectionId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PacketAttributes {
    pub packet: Packet,
    pub ordering: Order,
    pub connection_id: ConnectionId,
}

/// Event emitted by the IBC host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IbcEvent {
    RegisterClient {
        client_type: ClientType,
        light_client: Address,
    },
    CreateClient {
        client_id: ClientId,
        client_type: ClientType,
        consensus_height: Height,
    },
    UpdateClient {
        client_id: ClientId,
        consensus_heights: Vec<Height>,
    },
    BindPort {
        port_id: PortId,
        module: Address,
    },
    ConnectionOpenInit(ConnectionAttributes),
    ConnectionOpenTry(ConnectionAttributes),
    ConnectionOpenAck(ConnectionAttributes),
    ConnectionOpenConfirm(ConnectionAttributes),
    ChannelOpenInit {
        #[serde(flatten)]
        channel: ChannelAttributes,
        version: Version,
    },
    ChannelOpenTry {
        #[serde(flatten)]
        channel: ChannelAttributes,
        version: Version,
    },
    ChannelOpenAck(ChannelAttributes),
    ChannelOpenConfirm(ChannelAttributes),
    ChannelCloseInit(ChannelAttributes),
    ChannelCloseConfirm(ChannelAttributes),
    SendPacket(PacketAttributes),
    RecvPacket(PacketAttributes),
    WriteAcknowledgement {
        port_id: PortId,
        channel_id: ChannelId,
        sequence: Sequence,
        acknowledgement: Acknowledgement,
    },
    AcknowledgePacket(PacketAttributes),
    TimeoutPacket(PacketAttributes),
}

impl IbcEvent {
    /// Name of the event, as found in the `type` field of its JSON encoding.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegisterClient { .. } => "register_client",
            Self::CreateClient { .. } => "create_client",
            Self::UpdateClient { .. } => "update_client",
            Self::BindPort { .. } => "bind_port",
            Self::ConnectionOpenInit(_) => "connection_open_init",
            Self::ConnectionOpenTry(_) => "connection_open_try",
            Self::ConnectionOpenAck(_) => "connection_open_ack",
            Self::ConnectionOpenConfirm(_) => "connection_open_confirm",
            Self::ChannelOpenInit { .. } => "channel_open_init",
            Self::ChannelOpenTry { .. } => "channel_open_try",
            Self::ChannelOpenAck(_) => "channel_open_ack",
            Self::ChannelOpenConfirm(_) => "channel_open_confirm",
            Self::ChannelCloseInit(_) => "channel_close_init",
            Self::ChannelCloseConfirm(_) => "channel_close_confirm",
            Self::SendPacket(_) => "send_packet",
            Self::RecvPacket(_) => "recv_packet",
            Self::WriteAcknowledgement { .. } => "write_acknowledgement",
            Self::AcknowledgePacket(_) => "acknowledge_packet",
            Self::TimeoutPacket(_) => "timeout_packet",
        }
    }
}
