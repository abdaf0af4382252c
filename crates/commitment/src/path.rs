//! Canonical ICS-24 paths.

use core::fmt;

use ibc_engine_types::{ChannelId, ClientId, ConnectionId, Height, PortId, Sequence};

/// A path in the host's provable store.
///
/// Segments are joined with `/`, which validated identifiers never contain,
/// so distinct paths always render to distinct strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Path {
    ClientState(ClientId),
    ClientConsensusState(ClientId, Height),
    Connection(ConnectionId),
    ChannelEnd(PortId, ChannelId),
    SeqSend(PortId, ChannelId),
    SeqRecv(PortId, ChannelId),
    SeqAck(PortId, ChannelId),
    Commitment(PortId, ChannelId, Sequence),
    Ack(PortId, ChannelId, Sequence),
    Receipt(PortId, ChannelId, Sequence),
    /// Capability name of a port.
    Port(PortId),
    /// Capability name of a channel end.
    ChannelCapability(PortId, ChannelId),
}

impl Path {
    pub fn client_state(client_id: &ClientId) -> Self {
        Self::ClientState(client_id.clone())
    }

    pub fn consensus_state(client_id: &ClientId, height: Height) -> Self {
        Self::ClientConsensusState(client_id.clone(), height)
    }

    pub fn connection(connection_id: &ConnectionId) -> Self {
        Self::Connection(connection_id.clone())
    }

    pub fn channel_end(port_id: &PortId, channel_id: &ChannelId) -> Self {
        Self::ChannelEnd(port_id.clone(), channel_id.clone())
    }

    pub fn seq_send(port_id: &PortId, channel_id: &ChannelId) -> Self {
        Self::SeqSend(port_id.clone(), channel_id.clone())
    }

    pub fn seq_recv(port_id: &PortId, channel_id: &ChannelId) -> Self {
        Self::SeqRecv(port_id.clone(), channel_id.clone())
    }

    pub fn seq_ack(port_id: &PortId, channel_id: &ChannelId) -> Self {
        Self::SeqAck(port_id.clone(), channel_id.clone())
    }

    pub fn commitment(port_id: &PortId, channel_id: &ChannelId, sequence: Sequence) -> Self {
        Self::Commitment(port_id.clone(), channel_id.clone(), sequence)
    }

    pub fn ack(port_id: &PortId, channel_id: &ChannelId, sequence: Sequence) -> Self {
        Self::Ack(port_id.clone(), channel_id.clone(), sequence)
    }

    pub fn receipt(port_id: &PortId, channel_id: &ChannelId, sequence: Sequence) -> Self {
        Self::Receipt(port_id.clone(), channel_id.clone(), sequence)
    }

    pub fn port(port_id: &PortId) -> Self {
        Self::Port(port_id.clone())
    }

    pub fn channel_capability(port_id: &PortId, channel_id: &ChannelId) -> Self {
        Self::ChannelCapability(port_id.clone(), channel_id.clone())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientState(client) => write!(f, "clients/{client}/clientState"),
            Self::ClientConsensusState(client, height) => write!(
                f,
                "clients/{client}/consensusStates/{}-{}",
                height.revision_number, height.revision_height
            ),
            Self::Connection(conn) => write!(f, "connections/{conn}"),
            Self::ChannelEnd(port, chan) => write!(f, "channelEnds/ports/{port}/channels/{chan}"),
            Self::SeqSend(port, chan) => write!(f, "nextSequenceSend/ports/{port}/channels/{chan}"),
            Self::SeqRecv(port, chan) => write!(f, "nextSequenceRecv/ports/{port}/channels/{chan}"),
            Self::SeqAck(port, chan) => write!(f, "nextSequenceAck/ports/{port}/channels/{chan}"),
            Self::Commitment(port, chan, seq) => {
                write!(f, "commitments/ports/{port}/channels/{chan}/sequences/{seq}")
            }
            Self::Ack(port, chan, seq) => {
                write!(f, "acks/ports/{port}/channels/{chan}/sequences/{seq}")
            }
            Self::Receipt(port, chan, seq) => {
                write!(f, "receipts/ports/{port}/channels/{chan}/sequences/{seq}")
            }
            Self::Port(port) => write!(f, "ports/{port}"),
            Self::ChannelCapability(port, chan) => {
                write!(f, "capabilities/ports/{port}/channels/{chan}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ics24_layout() {
        let client: ClientId = "tendermint-0".parse().unwrap();
        let port = PortId::transfer();
        let chan = ChannelId::new(0);
        let seq = Sequence::from(1);

        let cases = [
            (Path::client_state(&client), "clients/tendermint-0/clientState"),
            (
                Path::consensus_state(&client, Height::new(1, 10)),
                "clients/tendermint-0/consensusStates/1-10",
            ),
            (Path::connection(&ConnectionId::new(0)), "connections/connection-0"),
            (
                Path::channel_end(&port, &chan),
                "channelEnds/ports/transfer/channels/channel-0",
            ),
            (
                Path::seq_recv(&port, &chan),
                "nextSequenceRecv/ports/transfer/channels/channel-0",
            ),
            (
                Path::commitment(&port, &chan, seq),
                "commitments/ports/transfer/channels/channel-0/sequences/1",
            ),
            (
                Path::ack(&port, &chan, seq),
                "acks/ports/transfer/channels/channel-0/sequences/1",
            ),
            (
                Path::receipt(&port, &chan, seq),
                "receipts/ports/transfer/channels/channel-0/sequences/1",
            ),
            (Path::port(&port), "ports/transfer"),
            (
                Path::channel_capability(&port, &chan),
                "capabilities/ports/transfer/channels/channel-0",
            ),
        ];

        for (path, expected) in cases {
            assert_eq!(path.to_string(), expected);
        }
    }

    #[test]
    fn distinct_paths_have_distinct_keys() {
        let port = PortId::transfer();
        let chan = ChannelId::new(0);
        let seq = Sequence::from(1);

        let keys = [
            crate::commitment_key(&Path::commitment(&port, &chan, seq)),
            crate::commitment_key(&Path::ack(&port, &chan, seq)),
            crate::commitment_key(&Path::receipt(&port, &chan, seq)),
            crate::commitment_key(&Path::commitment(&port, &ChannelId::new(10), seq)),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
