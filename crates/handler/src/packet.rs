//! ICS-04 packet lifecycle.

use ibc_engine_commitment::{packet_commitment, packet_commitment_bytes, Path};
use ibc_engine_store::{ReadStore, Store};
use ibc_engine_types::channel::{ChannelEnd, ChannelState, Order};
use ibc_engine_types::connection::ConnectionEnd;
use ibc_engine_types::msgs::{MsgAcknowledgement, MsgRecvPacket, MsgTimeout};
use ibc_engine_types::{
    Acknowledgement, Address, ChannelId, ConnectionId, IbcError, Packet, PortId, Sequence,
};
use tracing::{debug, info};

use crate::channel::ensure_channel_state;
use crate::context::{Context, Proof};
use crate::events::{IbcEvent, PacketAttributes};

/// Open channel end a packet travels through, with its connection.
struct PacketRoute {
    channel: ChannelEnd,
    connection_id: ConnectionId,
    connection: ConnectionEnd,
}

impl<S: ReadStore> Context<'_, S> {
    /// Look up the open channel `(port_id, channel_id)`, whose counterparty
    /// must be `(counterparty_port_id, counterparty_channel_id)`.
    fn packet_route(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        counterparty_port_id: &PortId,
        counterparty_channel_id: &ChannelId,
    ) -> Result<PacketRoute, IbcError> {
        let channel = self.channel_end(port_id, channel_id)?;
        ensure_channel_state(port_id, channel_id, &channel, ChannelState::Open)?;
        if !channel.counterparty_matches(counterparty_port_id, counterparty_channel_id) {
            return Err(IbcError::CounterpartyMismatch);
        }
        let (connection_id, connection) = self.channel_connection(&channel)?;
        Ok(PacketRoute {
            channel,
            connection_id,
            connection,
        })
    }

    /// Whether the packet at `sequence` was received on this chain.
    pub fn packet_received(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
    ) -> Result<bool, IbcError> {
        let channel = self.channel_end(port_id, channel_id)?;
        match channel.ordering {
            Order::Ordered => Ok(sequence < self.state.next_sequence_recv(port_id, channel_id)?),
            Order::Unordered => self
                .state
                .has_commitment(&Path::receipt(port_id, channel_id, sequence)),
        }
    }

    /// Ensure `packet` is still committed by this chain, unchanged.
    fn ensure_packet_commitment(&self, packet: &Packet) -> Result<(), IbcError> {
        let path = Path::commitment(&packet.source_port, &packet.source_channel, packet.sequence);
        let stored = self
            .state
            .commitment(&path)?
            .ok_or(IbcError::PacketCommitmentNotFound {
                sequence: packet.sequence,
            })?;
        if stored != packet_commitment(packet) {
            return Err(IbcError::PacketCommitmentMismatch {
                sequence: packet.sequence,
            });
        }
        Ok(())
    }
}

impl<S: Store> Context<'_, S> {
    /// Commit to an outgoing packet. The caller must own the source
    /// channel capability.
    pub fn send_packet(&mut self, caller: &Address, packet: Packet) -> Result<Sequence, IbcError> {
        let route = self.packet_route(
            &packet.source_port,
            &packet.source_channel,
            &packet.destination_port,
            &packet.destination_channel,
        )?;
        self.ensure_capability(
            caller,
            &Path::channel_capability(&packet.source_port, &packet.source_channel).to_string(),
        )?;
        if !packet.has_timeout() {
            return Err(IbcError::MissingTimeout);
        }

        let client_id = &route.connection.client_id;
        let latest_height = self.latest_height(client_id)?;
        let latest_timestamp = self.client_timestamp_at(client_id, latest_height)?;
        if packet.timed_out_at(latest_height, latest_timestamp) {
            return Err(IbcError::PacketTimedOut {
                sequence: packet.sequence,
            });
        }

        let next_sequence = self
            .state
            .next_sequence_send(&packet.source_port, &packet.source_channel)?;
        if packet.sequence != next_sequence {
            return Err(IbcError::InvalidPacketSequence {
                expected: next_sequence,
                actual: packet.sequence,
            });
        }
        let path = Path::commitment(&packet.source_port, &packet.source_channel, packet.sequence);
        if self.state.has_commitment(&path)? {
            return Err(IbcError::PacketCommitmentExists {
                sequence: packet.sequence,
            });
        }

        self.state.publish(&path, &packet_commitment_bytes(&packet))?;
        self.state.set_next_sequence_send(
            &packet.source_port,
            &packet.source_channel,
            next_sequence
                .checked_increment()
                .ok_or(IbcError::SequenceOverflow)?,
        )?;

        info!(
            port_id = %packet.source_port,
            channel_id = %packet.source_channel,
            sequence = %packet.sequence,
            "sent packet"
        );
        let sequence = packet.sequence;
        self.emit(IbcEvent::SendPacket(PacketAttributes {
            packet,
            ordering: route.channel.ordering,
            connection_id: route.connection_id,
        }));
        Ok(sequence)
    }

    pub fn recv_packet(&mut self, msg: MsgRecvPacket) -> Result<(), IbcError> {
        let packet = &msg.packet;
        let route = self.packet_route(
            &packet.destination_port,
            &packet.destination_channel,
            &packet.source_port,
            &packet.source_channel,
        )?;
        if packet.timed_out_at(self.block.height, self.block.timestamp) {
            return Err(IbcError::PacketTimedOut {
                sequence: packet.sequence,
            });
        }

        self.verify_membership(
            &route.connection,
            route.connection.delay_period,
            Proof::new(&msg.proof_commitment, msg.proof_height),
            &Path::commitment(&packet.source_port, &packet.source_channel, packet.sequence),
            &packet_commitment_bytes(packet),
        )?;

        let (port_id, channel_id) = (&packet.destination_port, &packet.destination_channel);
        match route.channel.ordering {
            Order::Ordered => {
                let next_sequence = self.state.next_sequence_recv(port_id, channel_id)?;
                if packet.sequence != next_sequence {
                    return Err(IbcError::InvalidPacketSequence {
                        expected: next_sequence,
                        actual: packet.sequence,
                    });
                }
                self.state.set_next_sequence_recv(
                    port_id,
                    channel_id,
                    next_sequence
                        .checked_increment()
                        .ok_or(IbcError::SequenceOverflow)?,
                )?;
            }
            Order::Unordered => {
                let receipt = Path::receipt(port_id, channel_id, packet.sequence);
                if self.state.has_commitment(&receipt)? {
                    return Err(IbcError::PacketAlreadyReceived {
                        sequence: packet.sequence,
                    });
                }
                self.state.set_receipt(&receipt)?;
            }
        }

        let acknowledgement = self.with_module(&Path::port(port_id).to_string(), |module, store| {
            module.on_recv_packet(store, packet, &msg.relayer)
        })?;

        info!(
            %port_id,
            %channel_id,
            sequence = %packet.sequence,
            relayer = %msg.relayer,
            "received packet"
        );
        self.emit(IbcEvent::RecvPacket(PacketAttributes {
            packet: packet.clone(),
            ordering: route.channel.ordering,
            connection_id: route.connection_id,
        }));

        if acknowledgement.is_empty() {
            debug!(sequence = %packet.sequence, "acknowledgement deferred by module");
            return Ok(());
        }
        self.store_acknowledgement(port_id, channel_id, packet.sequence, acknowledgement)
    }

    /// Write the acknowledgement of a packet received earlier, whose module
    /// deferred it. The caller must own the destination channel capability.
    pub fn write_acknowledgement(
        &mut self,
        caller: &Address,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
        acknowledgement: Acknowledgement,
    ) -> Result<(), IbcError> {
        let channel = self.channel_end(port_id, channel_id)?;
        ensure_channel_state(port_id, channel_id, &channel, ChannelState::Open)?;
        self.ensure_capability(
            caller,
            &Path::channel_capability(port_id, channel_id).to_string(),
        )?;
        if !self.packet_received(port_id, channel_id, sequence)? {
            return Err(IbcError::PacketNotReceived { sequence });
        }
        self.store_acknowledgement(port_id, channel_id, sequence, acknowledgement)
    }

    fn store_acknowledgement(
        &mut self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
        acknowledgement: Acknowledgement,
    ) -> Result<(), IbcError> {
        if acknowledgement.is_empty() {
            return Err(IbcError::EmptyAcknowledgement);
        }
        let path = Path::ack(port_id, channel_id, sequence);
        if self.state.has_commitment(&path)? {
            return Err(IbcError::AcknowledgementExists { sequence });
        }
        self.state.publish(&path, acknowledgement.as_bytes())?;

        debug!(%port_id, %channel_id, %sequence, "wrote acknowledgement");
        self.emit(IbcEvent::WriteAcknowledgement {
            port_id: port_id.clone(),
            channel_id: channel_id.clone(),
            sequence,
            acknowledgement,
        });
        Ok(())
    }

    pub fn acknowledge_packet(&mut self, msg: MsgAcknowledgement) -> Result<(), IbcError> {
        let packet = &msg.packet;
        let route = self.packet_route(
            &packet.source_port,
            &packet.source_channel,
            &packet.destination_port,
            &packet.destination_channel,
        )?;
        self.ensure_packet_commitment(packet)?;

        self.verify_membership(
            &route.connection,
            route.connection.delay_period,
            Proof::new(&msg.proof_acked, msg.proof_height),
            &Path::ack(
                &packet.destination_port,
                &packet.destination_channel,
                packet.sequence,
            ),
            msg.acknowledgement.as_bytes(),
        )?;

        let (port_id, channel_id) = (&packet.source_port, &packet.source_channel);
        if route.channel.ordering == Order::Ordered {
            let next_sequence = self.state.next_sequence_ack(port_id, channel_id)?;
            if packet.sequence != next_sequence {
                return Err(IbcError::InvalidPacketSequence {
                    expected: next_sequence,
                    actual: packet.sequence,
                });
            }
            self.state.set_next_sequence_ack(
                port_id,
                channel_id,
                next_sequence
                    .checked_increment()
                    .ok_or(IbcError::SequenceOverflow)?,
            )?;
        }
        self.state
            .delete_commitment(&Path::commitment(port_id, channel_id, packet.sequence))?;

        self.with_module(&Path::port(port_id).to_string(), |module, store| {
            module.on_acknowledgement_packet(store, packet, &msg.acknowledgement, &msg.relayer)
        })?;

        info!(%port_id, %channel_id, sequence = %packet.sequence, "acknowledged packet");
        self.emit(IbcEvent::AcknowledgePacket(PacketAttributes {
            packet: packet.clone(),
            ordering: route.channel.ordering,
            connection_id: route.connection_id,
        }));
        Ok(())
    }

    /// Abandon a packet the counterparty can no longer receive. Timing out
    /// a packet of an ordered channel closes the channel.
    pub fn timeout_packet(&mut self, msg: MsgTimeout) -> Result<(), IbcError> {
        let packet = &msg.packet;
        let mut route = self.packet_route(
            &packet.source_port,
            &packet.source_channel,
            &packet.destination_port,
            &packet.destination_channel,
        )?;
        self.ensure_packet_commitment(packet)?;

        let client_id = &route.connection.client_id;
        let proof_timestamp = self.client_timestamp_at(client_id, msg.proof_height)?;
        if !packet.timed_out_at(msg.proof_height, proof_timestamp) {
            return Err(IbcError::PacketNotTimedOut {
                sequence: packet.sequence,
            });
        }

        let proof = Proof::new(&msg.proof_unreceived, msg.proof_height);
        let (dst_port, dst_channel) = (&packet.destination_port, &packet.destination_channel);
        match route.channel.ordering {
            Order::Ordered => {
                let next_sequence_recv = Sequence::from(msg.next_sequence_recv);
                if next_sequence_recv > packet.sequence {
                    return Err(IbcError::PacketAlreadyRelayed {
                        sequence: packet.sequence,
                    });
                }
                self.verify_membership(
                    &route.connection,
                    route.connection.delay_period,
                    proof,
                    &Path::seq_recv(dst_port, dst_channel),
                    &next_sequence_recv.to_be_bytes(),
                )?;
            }
            Order::Unordered => {
                self.verify_non_membership(
                    &route.connection,
                    route.connection.delay_period,
                    proof,
                    &Path::receipt(dst_port, dst_channel, packet.sequence),
                )?;
            }
        }

        let (port_id, channel_id) = (&packet.source_port, &packet.source_channel);
        self.state
            .delete_commitment(&Path::commitment(port_id, channel_id, packet.sequence))?;
        if route.channel.ordering == Order::Ordered {
            route.channel.state = ChannelState::Closed;
            self.state.set_channel(port_id, channel_id, &route.channel)?;
            info!(%port_id, %channel_id, "closed ordered channel after timeout");
        }

        self.with_module(&Path::port(port_id).to_string(), |module, store| {
            module.on_timeout_packet(store, packet, &msg.relayer)
        })?;

        info!(%port_id, %channel_id, sequence = %packet.sequence, "timed out packet");
        self.emit(IbcEvent::TimeoutPacket(PacketAttributes {
            packet: packet.clone(),
            ordering: route.channel.ordering,
            connection_id: route.connection_id,
        }));
        Ok(())
    }
}
