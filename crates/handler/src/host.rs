//! The IBC host: owns the store, the deployed collaborators, and the
//! transaction boundary every engine operation runs behind.

use ibc_engine_commitment::Path;
use ibc_engine_module::{IbcModule, LightClient};
use ibc_engine_store::{cache, CacheStore, Store};
use ibc_engine_types::channel::ChannelEnd;
use ibc_engine_types::connection::ConnectionEnd;
use ibc_engine_types::msgs::{
    MsgAcknowledgement, MsgChannelCloseConfirm, MsgChannelCloseInit, MsgChannelOpenAck,
    MsgChannelOpenConfirm, MsgChannelOpenInit, MsgChannelOpenTry, MsgConnectionOpenAck,
    MsgConnectionOpenConfirm, MsgConnectionOpenInit, MsgConnectionOpenTry, MsgCreateClient,
    MsgRecvPacket, MsgTimeout, MsgUpdateClient,
};
use ibc_engine_types::{
    Acknowledgement, Address, ChannelId, ClientId, ClientType, ConnectionId, Height, IbcError,
    Packet, PortId, Sequence,
};
use tracing::{debug, debug_span, warn};

use crate::client::ClientRecord;
use crate::config::{ConfigError, HostConfig};
use crate::context::{BlockInfo, Context, LightClients, Modules};
use crate::events::IbcEvent;

/// IBC host, driving the engine over a store `S`.
///
/// Every state-changing method is a transaction: it either applies all of
/// its writes and emits its events, or fails without any side effect.
pub struct IbcHost<S> {
    store: S,
    config: HostConfig,
    light_clients: LightClients,
    modules: Modules,
    block: BlockInfo,
    events: Vec<IbcEvent>,
}

impl<S: Store> IbcHost<S> {
    pub fn new(store: S, config: HostConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            light_clients: LightClients::new(),
            modules: Modules::new(),
            block: BlockInfo::default(),
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn block(&self) -> BlockInfo {
        self.block
    }

    /// Deploy a light client at `address`, replacing any previous one.
    pub fn deploy_light_client(
        &mut self,
        address: Address,
        light_client: impl LightClient + 'static,
    ) {
        debug!(%address, "deployed light client");
        self.light_clients.insert(address, Box::new(light_client));
    }

    /// Deploy an application module at `address`, replacing any previous one.
    pub fn deploy_module(&mut self, address: Address, module: impl IbcModule + 'static) {
        debug!(%address, "deployed module");
        self.modules.insert(address, Box::new(module));
    }

    /// Start executing a new block.
    pub fn begin_block(&mut self, height: Height, timestamp: u64) {
        self.block = BlockInfo { height, timestamp };
    }

    /// Drain the events emitted by the transactions applied so far.
    pub fn take_events(&mut self) -> Vec<IbcEvent> {
        std::mem::take(&mut self.events)
    }

    fn query(&self) -> Context<'_, &S> {
        Context::new(
            &self.store,
            &self.light_clients,
            &self.modules,
            &self.config,
            self.block,
        )
    }

    /// Run `op` against a write-buffering view of the store, committing its
    /// writes and events only if it succeeds.
    fn transact<T>(
        &mut self,
        name: &'static str,
        op: impl FnOnce(&mut Context<'_, CacheStore<'_, S>>) -> Result<T, IbcError>,
    ) -> Result<T, IbcError> {
        let span = debug_span!("transaction", op = name, height = %self.block.height);
        let _guard = span.enter();

        let (result, pending, events) = {
            let mut ctx = Context::new(
                CacheStore::new(&self.store),
                &self.light_clients,
                &self.modules,
                &self.config,
                self.block,
            );
            let result = op(&mut ctx);
            let (cache, events) = ctx.into_parts();
            (result, cache.into_pending(), events)
        };

        match result {
            Ok(value) => {
                cache::flush(&mut self.store, pending).map_err(IbcError::Store)?;
                debug!(events = events.len(), "transaction committed");
                self.events.extend(events);
                Ok(value)
            }
            Err(err) => {
                warn!(%err, kind = ?err.kind(), "transaction aborted");
                Err(err)
            }
        }
    }

    // --- client registry ---

    pub fn register_client(
        &mut self,
        caller: &Address,
        client_type: &ClientType,
        light_client: &Address,
    ) -> Result<(), IbcError> {
        self.transact("register_client", |ctx| {
            ctx.register_client(caller, client_type, light_client)
        })
    }

    pub fn create_client(&mut self, msg: MsgCreateClient) -> Result<ClientId, IbcError> {
        self.transact("create_client", |ctx| ctx.create_client(msg))
    }

    pub fn update_client(&mut self, msg: MsgUpdateClient) -> Result<(), IbcError> {
        self.transact("update_client", |ctx| ctx.update_client(msg))
    }

    // --- capabilities ---

    pub fn bind_port(
        &mut self,
        caller: &Address,
        port_id: &PortId,
        module: &Address,
    ) -> Result<(), IbcError> {
        self.transact("bind_port", |ctx| ctx.bind_port(caller, port_id, module))
    }

    /// Claim the capability `name` on behalf of the module `caller`.
    pub fn claim_capability(&mut self, caller: &Address, name: &str) -> Result<(), IbcError> {
        self.transact("claim_capability", |ctx| {
            if !ctx.is_module_deployed(caller) {
                return Err(IbcError::ModuleNotFound {
                    name: caller.to_string(),
                });
            }
            ctx.claim_capability(name, caller)
        })
    }

    // --- connections ---

    pub fn connection_open_init(
        &mut self,
        msg: MsgConnectionOpenInit,
    ) -> Result<ConnectionId, IbcError> {
        self.transact("connection_open_init", |ctx| ctx.connection_open_init(msg))
    }

    pub fn connection_open_try(
        &mut self,
        msg: MsgConnectionOpenTry,
    ) -> Result<ConnectionId, IbcError> {
        self.transact("connection_open_try", |ctx| ctx.connection_open_try(msg))
    }

    pub fn connection_open_ack(&mut self, msg: MsgConnectionOpenAck) -> Result<(), IbcError> {
        self.transact("connection_open_ack", |ctx| ctx.connection_open_ack(msg))
    }

    pub fn connection_open_confirm(
        &mut self,
        msg: MsgConnectionOpenConfirm,
    ) -> Result<(), IbcError> {
        self.transact("connection_open_confirm", |ctx| {
            ctx.connection_open_confirm(msg)
        })
    }

    // --- channels ---

    pub fn channel_open_init(&mut self, msg: MsgChannelOpenInit) -> Result<ChannelId, IbcError> {
        self.transact("channel_open_init", |ctx| ctx.channel_open_init(msg))
    }

    pub fn channel_open_try(&mut self, msg: MsgChannelOpenTry) -> Result<ChannelId, IbcError> {
        self.transact("channel_open_try", |ctx| ctx.channel_open_try(msg))
    }

    pub fn channel_open_ack(&mut self, msg: MsgChannelOpenAck) -> Result<(), IbcError> {
        self.transact("channel_open_ack", |ctx| ctx.channel_open_ack(msg))
    }

    pub fn channel_open_confirm(&mut self, msg: MsgChannelOpenConfirm) -> Result<(), IbcError> {
        self.transact("channel_open_confirm", |ctx| ctx.channel_open_confirm(msg))
    }

    pub fn channel_close_init(&mut self, msg: MsgChannelCloseInit) -> Result<(), IbcError> {
        self.transact("channel_close_init", |ctx| ctx.channel_close_init(msg))
    }

    pub fn channel_close_confirm(&mut self, msg: MsgChannelCloseConfirm) -> Result<(), IbcError> {
        self.transact("channel_close_confirm", |ctx| ctx.channel_close_confirm(msg))
    }

    // --- packets ---

    pub fn send_packet(&mut self, caller: &Address, packet: Packet) -> Result<Sequence, IbcError> {
        self.transact("send_packet", |ctx| ctx.send_packet(caller, packet))
    }

    pub fn recv_packet(&mut self, msg: MsgRecvPacket) -> Result<(), IbcError> {
        self.transact("recv_packet", |ctx| ctx.recv_packet(msg))
    }

    pub fn write_acknowledgement(
        &mut self,
        caller: &Address,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
        acknowledgement: Acknowledgement,
    ) -> Result<(), IbcError> {
        self.transact("write_acknowledgement", |ctx| {
            ctx.write_acknowledgement(caller, port_id, channel_id, sequence, acknowledgement)
        })
    }

    pub fn acknowledge_packet(&mut self, msg: MsgAcknowledgement) -> Result<(), IbcError> {
        self.transact("acknowledge_packet", |ctx| ctx.acknowledge_packet(msg))
    }

    pub fn timeout_packet(&mut self, msg: MsgTimeout) -> Result<(), IbcError> {
        self.transact("timeout_packet", |ctx| ctx.timeout_packet(msg))
    }

    // --- queries ---

    pub fn client(&self, client_id: &ClientId) -> Result<ClientRecord, IbcError> {
        self.query().client_record(client_id)
    }

    pub fn latest_height(&self, client_id: &ClientId) -> Result<Height, IbcError> {
        self.query().latest_height(client_id)
    }

    pub fn client_state(&self, client_id: &ClientId) -> Result<Option<Vec<u8>>, IbcError> {
        self.query().client_state(client_id)
    }

    pub fn consensus_state(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<Option<Vec<u8>>, IbcError> {
        self.query().consensus_state(client_id, height)
    }

    pub fn connection(&self, connection_id: &ConnectionId) -> Result<ConnectionEnd, IbcError> {
        self.query().connection_end(connection_id)
    }

    pub fn channel(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<ChannelEnd, IbcError> {
        self.query().channel_end(port_id, channel_id)
    }

    pub fn next_sequence_send(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<Sequence, IbcError> {
        self.query().state.next_sequence_send(port_id, channel_id)
    }

    pub fn next_sequence_recv(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<Sequence, IbcError> {
        self.query().state.next_sequence_recv(port_id, channel_id)
    }

    pub fn next_sequence_ack(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<Sequence, IbcError> {
        self.query().state.next_sequence_ack(port_id, channel_id)
    }

    /// Raw value of the commitment store at `path`. This is what a
    /// counterparty light client proves against.
    pub fn commitment(&self, path: &Path) -> Result<Option<Vec<u8>>, IbcError> {
        self.query().state.commitment(path)
    }

    pub fn packet_received(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
    ) -> Result<bool, IbcError> {
        self.query().packet_received(port_id, channel_id, sequence)
    }

    pub fn lookup_module(&self, name: &str) -> Result<Address, IbcError> {
        self.query().lookup_module(name)
    }

    pub fn authenticate_capability(&self, caller: &Address, name: &str) -> Result<bool, IbcError> {
        self.query().authenticate_capability(caller, name)
    }
}
