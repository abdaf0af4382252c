//! Application module callbacks, as specified in ICS-26.

use ibc_engine_store::Store;
use ibc_engine_types::channel::{Counterparty, Order, Version};
use ibc_engine_types::{
    Acknowledgement, Address, BoxError, ChannelId, ConnectionId, Packet, PortId,
};

/// Application bound to one or more ports.
///
/// Returning an error from any callback aborts the whole transaction,
/// including the core state transition that triggered it.
pub trait IbcModule {
    /// Accept or reject a channel being opened on this chain, returning the
    /// version the channel will use.
    #[allow(clippy::too_many_arguments)]
    fn on_chan_open_init(
        &self,
        store: &mut dyn Store,
        order: Order,
        connection_hops: &[ConnectionId],
        port_id: &PortId,
        channel_id: &ChannelId,
        counterparty: &Counterparty,
        version: &Version,
    ) -> Result<Version, BoxError>;

    /// Accept or reject a channel opened by the counterparty, returning the
    /// version the channel will use.
    #[allow(clippy::too_many_arguments)]
    fn on_chan_open_try(
        &self,
        store: &mut dyn Store,
        order: Order,
        connection_hops: &[ConnectionId],
        port_id: &PortId,
        channel_id: &ChannelId,
        counterparty: &Counterparty,
        counterparty_version: &Version,
    ) -> Result<Version, BoxError>;

    fn on_chan_open_ack(
        &self,
        _store: &mut dyn Store,
        _port_id: &PortId,
        _channel_id: &ChannelId,
        _counterparty_channel_id: &ChannelId,
        _counterparty_version: &Version,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    fn on_chan_open_confirm(
        &self,
        _store: &mut dyn Store,
        _port_id: &PortId,
        _channel_id: &ChannelId,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    fn on_chan_close_init(
        &self,
        _store: &mut dyn Store,
        _port_id: &PortId,
        _channel_id: &ChannelId,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    fn on_chan_close_confirm(
        &self,
        _store: &mut dyn Store,
        _port_id: &PortId,
        _channel_id: &ChannelId,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Process a received packet. An empty acknowledgement defers writing
    /// the acknowledgement to a later transaction.
    fn on_recv_packet(
        &self,
        store: &mut dyn Store,
        packet: &Packet,
        relayer: &Address,
    ) -> Result<Acknowledgement, BoxError>;

    /// Finalize, or roll back, a packet sent by this module.
    fn on_acknowledgement_packet(
        &self,
        store: &mut dyn Store,
        packet: &Packet,
        acknowledgement: &Acknowledgement,
        relayer: &Address,
    ) -> Result<(), BoxError>;

    /// Roll back a packet sent by this module that will never be received.
    fn on_timeout_packet(
        &self,
        store: &mut dyn Store,
        packet: &Packet,
        relayer: &Address,
    ) -> Result<(), BoxError>;
}
