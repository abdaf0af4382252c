use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use borsh::{BorshDeserialize, BorshSerialize};
use ibc_engine_commitment::{keccak256, Path};
use ibc_engine_module::{ClientUpdate, ConsensusStateUpdate, IbcModule, LightClient, ProofContext};
use ibc_engine_store::{MemoryStore, NamespacedStore, ReadStore, Store};
use ibc_engine_types::channel::{self, Order};
use ibc_engine_types::connection::{self, ConnectionState};
use ibc_engine_types::msgs::*;
use ibc_engine_types::{
    Acknowledgement, Address, BoxError, ChannelId, ClientId, ClientType, ConnectionId, Height,
    Packet, PortId, Sequence,
};

use crate::config::HostConfig;
use crate::host::IbcHost;

pub type Host = IbcHost<MemoryStore>;

pub mod addresses {
    pub const ADMIN: &str = "admin";
    pub const LIGHT_CLIENT: &str = "mock-light-client";
    pub const MODULE: &str = "transfer-module";
    pub const RELAYER: &str = "relayer";
    pub const MALLORY: &str = "mallory";
}

pub const CLIENT_TYPE: &str = "tendermint";
pub const CHANNEL_VERSION: &str = "ics20-1";

/// Height of the consensus state every test client starts with.
pub const CLIENT_HEIGHT: Height = Height::new(0, 10);
pub const CLIENT_TIMESTAMP: u64 = 1_000_000;

/// Host block every test chain starts at.
pub const HOST_HEIGHT: Height = Height::new(0, 5);
pub const HOST_TIMESTAMP: u64 = 500_000;

pub trait StrExt {
    fn address(&self) -> Address;
}

impl StrExt for str {
    fn address(&self) -> Address {
        self.into()
    }
}

// --- mock light client ---

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MockClientState {
    pub latest_height: Height,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MockConsensusState {
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MockHeader {
    pub height: Height,
    pub timestamp: u64,
}

/// Light client trusting whatever proof equals the commitment it expects.
///
/// A membership proof is the `keccak256` hash of the proven value, which is
/// exactly what the counterparty host stores at the proven path. A
/// non-membership proof is empty.
#[derive(Clone, Debug, Default)]
pub struct MockLightClient {
    reject_proofs: Rc<Cell<bool>>,
}

impl MockLightClient {
    /// Make every subsequent proof verification fail, or pass again.
    pub fn reject_proofs(&self, reject: bool) {
        self.reject_proofs.set(reject);
    }
}

fn client_state_key(client_id: &ClientId) -> Vec<u8> {
    format!("clientState/{client_id}").into_bytes()
}

fn consensus_state_key(client_id: &ClientId, height: Height) -> Vec<u8> {
    format!("consensusStates/{client_id}/{height}").into_bytes()
}

impl MockLightClient {
    fn read_client_state<S: ReadStore + ?Sized>(
        store: &S,
        client_id: &ClientId,
    ) -> Result<MockClientState, BoxError> {
        let bytes = store
            .read(&client_state_key(client_id))?
            .ok_or("client not found")?;
        Ok(borsh::from_slice(&bytes)?)
    }

    fn read_consensus_state<S: ReadStore + ?Sized>(
        store: &S,
        client_id: &ClientId,
        height: Height,
    ) -> Result<MockConsensusState, BoxError> {
        let bytes = store
            .read(&consensus_state_key(client_id, height))?
            .ok_or("consensus state not found")?;
        Ok(borsh::from_slice(&bytes)?)
    }

    fn check_proof(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
        proof: &ProofContext<'_>,
    ) -> Result<bool, BoxError> {
        Self::read_consensus_state(store, client_id, proof.height)?;
        Ok(!self.reject_proofs.get())
    }
}

impl LightClient for MockLightClient {
    fn create_client(
        &self,
        store: &mut dyn Store,
        client_id: &ClientId,
        client_state: &[u8],
        consensus_state: &[u8],
    ) -> Result<ClientUpdate, BoxError> {
        let state: MockClientState = borsh::from_slice(client_state)?;
        let _: MockConsensusState = borsh::from_slice(consensus_state)?;

        store.write(&client_state_key(client_id), client_state)?;
        store.write(
            &consensus_state_key(client_id, state.latest_height),
            consensus_state,
        )?;

        Ok(ClientUpdate {
            client_state_commitment: keccak256(client_state),
            consensus_state_updates: vec![ConsensusStateUpdate {
                height: state.latest_height,
                consensus_state_commitment: keccak256(consensus_state),
            }],
        })
    }

    fn update_client(
        &self,
        store: &mut dyn Store,
        client_id: &ClientId,
        client_message: &[u8],
    ) -> Result<ClientUpdate, BoxError> {
        let header: MockHeader = borsh::from_slice(client_message)?;
        let mut state = Self::read_client_state(&*store, client_id)?;
        if header.height <= state.latest_height {
            return Err("header is not newer than the client".into());
        }
        state.latest_height = header.height;

        let client_state = borsh::to_vec(&state)?;
        let consensus_state = borsh::to_vec(&MockConsensusState {
            timestamp: header.timestamp,
        })?;
        store.write(&client_state_key(client_id), &client_state)?;
        store.write(&consensus_state_key(client_id, header.height), &consensus_state)?;

        Ok(ClientUpdate {
            client_state_commitment: keccak256(&client_state),
            consensus_state_updates: vec![ConsensusStateUpdate {
                height: header.height,
                consensus_state_commitment: keccak256(&consensus_state),
            }],
        })
    }

    fn latest_height(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
    ) -> Result<Height, BoxError> {
        Ok(Self::read_client_state(store, client_id)?.latest_height)
    }

    fn timestamp_at_height(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
        height: Height,
    ) -> Result<u64, BoxError> {
        Ok(Self::read_consensus_state(store, client_id, height)?.timestamp)
    }

    fn client_state(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
    ) -> Result<Option<Vec<u8>>, BoxError> {
        store.read(&client_state_key(client_id))
    }

    fn consensus_state(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
        height: Height,
    ) -> Result<Option<Vec<u8>>, BoxError> {
        store.read(&consensus_state_key(client_id, height))
    }

    fn verify_membership(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
        proof: ProofContext<'_>,
        value: &[u8],
    ) -> Result<bool, BoxError> {
        Ok(self.check_proof(store, client_id, &proof)? && proof.proof == keccak256(value))
    }

    fn verify_non_membership(
        &self,
        store: &dyn ReadStore,
        client_id: &ClientId,
        proof: ProofContext<'_>,
    ) -> Result<bool, BoxError> {
        Ok(self.check_proof(store, client_id, &proof)? && proof.proof.is_empty())
    }
}

// --- mock module ---

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Callback {
    ChanOpenInit,
    ChanOpenTry,
    ChanOpenAck,
    ChanOpenConfirm,
    ChanCloseInit,
    ChanCloseConfirm,
    RecvPacket,
    AcknowledgementPacket,
    TimeoutPacket,
}

#[derive(Debug, Default)]
struct ModuleBehaviour {
    failures: HashSet<Callback>,
    /// Acknowledgement returned from `on_recv_packet`. Empty defers it.
    ack: Vec<u8>,
}

/// Application module recording every callback it gets in its store slice.
#[derive(Clone, Debug)]
pub struct MockModule {
    behaviour: Rc<RefCell<ModuleBehaviour>>,
}

impl Default for MockModule {
    fn default() -> Self {
        Self {
            behaviour: Rc::new(RefCell::new(ModuleBehaviour {
                failures: HashSet::new(),
                ack: b"ok".to_vec(),
            })),
        }
    }
}

const CALLBACKS_KEY: &[u8] = b"callbacks";

impl MockModule {
    pub fn fail_on(&self, callback: Callback) {
        self.behaviour.borrow_mut().failures.insert(callback);
    }

    pub fn clear_failures(&self) {
        self.behaviour.borrow_mut().failures.clear();
    }

    pub fn set_ack(&self, ack: &[u8]) {
        self.behaviour.borrow_mut().ack = ack.to_vec();
    }

    fn record(
        &self,
        store: &mut dyn Store,
        callback: Callback,
        detail: String,
    ) -> Result<(), BoxError> {
        if self.behaviour.borrow().failures.contains(&callback) {
            return Err(format!("{callback:?} rejected").into());
        }
        let mut records: Vec<String> = match store.read(CALLBACKS_KEY)? {
            Some(bytes) => borsh::from_slice(&bytes)?,
            None => Vec::new(),
        };
        records.push(format!("{callback:?} {detail}"));
        store.write(CALLBACKS_KEY, &borsh::to_vec(&records)?)?;
        Ok(())
    }
}

/// Callbacks recorded by the module deployed at `module`, in call order.
pub fn recorded_callbacks(host: &Host, module: &str) -> Vec<String> {
    let namespace = format!("modules/{module}");
    NamespacedStore::new(&namespace, host.store())
        .read(CALLBACKS_KEY)
        .unwrap()
        .map(|bytes| borsh::from_slice(&bytes).unwrap())
        .unwrap_or_default()
}

impl IbcModule for MockModule {
    fn on_chan_open_init(
        &self,
        store: &mut dyn Store,
        _order: Order,
        _connection_hops: &[ConnectionId],
        port_id: &PortId,
        channel_id: &ChannelId,
        _counterparty: &channel::Counterparty,
        version: &channel::Version,
    ) -> Result<channel::Version, BoxError> {
        self.record(store, Callback::ChanOpenInit, format!("{port_id}/{channel_id}"))?;
        if version.is_empty() {
            return Ok(channel::Version::new(CHANNEL_VERSION));
        }
        Ok(version.clone())
    }

    fn on_chan_open_try(
        &self,
        store: &mut dyn Store,
        _order: Order,
        _connection_hops: &[ConnectionId],
        port_id: &PortId,
        channel_id: &ChannelId,
        _counterparty: &channel::Counterparty,
        counterparty_version: &channel::Version,
    ) -> Result<channel::Version, BoxError> {
        self.record(store, Callback::ChanOpenTry, format!("{port_id}/{channel_id}"))?;
        Ok(counterparty_version.clone())
    }

    fn on_chan_open_ack(
        &self,
        store: &mut dyn Store,
        port_id: &PortId,
        channel_id: &ChannelId,
        _counterparty_channel_id: &ChannelId,
        _counterparty_version: &channel::Version,
    ) -> Result<(), BoxError> {
        self.record(store, Callback::ChanOpenAck, format!("{port_id}/{channel_id}"))
    }

    fn on_chan_open_confirm(
        &self,
        store: &mut dyn Store,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<(), BoxError> {
        self.record(store, Callback::ChanOpenConfirm, format!("{port_id}/{channel_id}"))
    }

    fn on_chan_close_init(
        &self,
        store: &mut dyn Store,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<(), BoxError> {
        self.record(store, Callback::ChanCloseInit, format!("{port_id}/{channel_id}"))
    }

    fn on_chan_close_confirm(
        &self,
        store: &mut dyn Store,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<(), BoxError> {
        self.record(store, Callback::ChanCloseConfirm, format!("{port_id}/{channel_id}"))
    }

    fn on_recv_packet(
        &self,
        store: &mut dyn Store,
        packet: &Packet,
        _relayer: &Address,
    ) -> Result<Acknowledgement, BoxError> {
        self.record(store, Callback::RecvPacket, packet.sequence.to_string())?;
        Ok(self.behaviour.borrow().ack.clone().into())
    }

    fn on_acknowledgement_packet(
        &self,
        store: &mut dyn Store,
        packet: &Packet,
        acknowledgement: &Acknowledgement,
        _relayer: &Address,
    ) -> Result<(), BoxError> {
        self.record(
            store,
            Callback::AcknowledgementPacket,
            format!("{} {acknowledgement}", packet.sequence),
        )
    }

    fn on_timeout_packet(
        &self,
        store: &mut dyn Store,
        packet: &Packet,
        _relayer: &Address,
    ) -> Result<(), BoxError> {
        self.record(store, Callback::TimeoutPacket, packet.sequence.to_string())
    }
}

// --- chain setup ---

/// A host with a mock light client and a mock module deployed, and the
/// handles to steer them.
pub struct Chain {
    pub host: Host,
    pub light_client: MockLightClient,
    pub module: MockModule,
}

impl Chain {
    /// Set up a chain with the `tendermint` client type registered and the
    /// `transfer` port bound.
    pub fn new() -> Self {
        Self::with_config(HostConfig::default())
    }

    /// Same as [`Chain::new`], with `config` and the test admin.
    pub fn with_config(config: HostConfig) -> Self {
        let config = HostConfig {
            admin: Some(addresses::ADMIN.address()),
            ..config
        };
        let mut host = Host::new(MemoryStore::default(), config).unwrap();
        let light_client = MockLightClient::default();
        let module = MockModule::default();

        host.deploy_light_client(addresses::LIGHT_CLIENT.address(), light_client.clone());
        host.deploy_module(addresses::MODULE.address(), module.clone());
        host.begin_block(HOST_HEIGHT, HOST_TIMESTAMP);

        host.register_client(
            &addresses::ADMIN.address(),
            &client_type(),
            &addresses::LIGHT_CLIENT.address(),
        )
        .unwrap();
        host.bind_port(
            &addresses::ADMIN.address(),
            &PortId::transfer(),
            &addresses::MODULE.address(),
        )
        .unwrap();
        host.take_events();

        Self {
            host,
            light_client,
            module,
        }
    }

    pub fn create_client(&mut self) -> ClientId {
        self.host.create_client(create_client_msg()).unwrap()
    }

    /// Advance the client to `height`, with a consensus state at `timestamp`.
    pub fn update_client(&mut self, client_id: &ClientId, height: Height, timestamp: u64) {
        self.host
            .update_client(MsgUpdateClient {
                client_id: client_id.clone(),
                client_message: borsh::to_vec(&MockHeader { height, timestamp }).unwrap(),
            })
            .unwrap();
    }

    pub fn proof_height(&self, client_id: &ClientId) -> Height {
        self.host.latest_height(client_id).unwrap()
    }
}

pub fn client_type() -> ClientType {
    CLIENT_TYPE.parse().unwrap()
}

pub fn create_client_msg() -> MsgCreateClient {
    MsgCreateClient {
        client_type: client_type(),
        client_state: borsh::to_vec(&MockClientState {
            latest_height: CLIENT_HEIGHT,
        })
        .unwrap(),
        consensus_state: borsh::to_vec(&MockConsensusState {
            timestamp: CLIENT_TIMESTAMP,
        })
        .unwrap(),
    }
}

/// Membership proof of whatever `host` stores at `path`, or an
/// non-membership proof if it stores nothing.
pub fn prove(host: &Host, path: &Path) -> Vec<u8> {
    host.commitment(path).unwrap().unwrap_or_default()
}

// --- connection handshake messages ---

pub fn conn_open_init_msg(
    client_id: &ClientId,
    counterparty_client_id: &ClientId,
) -> MsgConnectionOpenInit {
    MsgConnectionOpenInit {
        client_id: client_id.clone(),
        counterparty: connection::Counterparty {
            client_id: counterparty_client_id.clone(),
            connection_id: None,
            prefix: HostConfig::default().merkle_prefix(),
        },
        version: None,
        delay_period: 0,
    }
}

/// Try message answering the connection `counterparty_connection_id`
/// initialized on `counterparty`.
pub fn conn_open_try_msg(
    counterparty: &Host,
    counterparty_connection_id: &ConnectionId,
    proof_height: Height,
) -> MsgConnectionOpenTry {
    let end = counterparty.connection(counterparty_connection_id).unwrap();
    MsgConnectionOpenTry {
        client_id: end.counterparty.client_id.clone(),
        counterparty: connection::Counterparty {
            client_id: end.client_id.clone(),
            connection_id: Some(counterparty_connection_id.clone()),
            prefix: counterparty.config().merkle_prefix(),
        },
        delay_period: end.delay_period,
        client_state: counterparty.client_state(&end.client_id).unwrap().unwrap(),
        counterparty_versions: end.versions,
        proof_init: prove(counterparty, &Path::connection(counterparty_connection_id)),
        proof_client: prove(counterparty, &Path::client_state(&end.client_id)),
        proof_height,
    }
}

pub fn conn_open_ack_msg(
    counterparty: &Host,
    connection_id: &ConnectionId,
    counterparty_connection_id: &ConnectionId,
    proof_height: Height,
) -> MsgConnectionOpenAck {
    let end = counterparty.connection(counterparty_connection_id).unwrap();
    assert_eq!(end.state, ConnectionState::TryOpen);
    MsgConnectionOpenAck {
        connection_id: connection_id.clone(),
        counterparty_connection_id: counterparty_connection_id.clone(),
        version: end.versions[0].clone(),
        client_state: counterparty.client_state(&end.client_id).unwrap().unwrap(),
        proof_try: prove(counterparty, &Path::connection(counterparty_connection_id)),
        proof_client: prove(counterparty, &Path::client_state(&end.client_id)),
        proof_height,
    }
}

pub fn conn_open_confirm_msg(
    counterparty: &Host,
    connection_id: &ConnectionId,
    counterparty_connection_id: &ConnectionId,
    proof_height: Height,
) -> MsgConnectionOpenConfirm {
    MsgConnectionOpenConfirm {
        connection_id: connection_id.clone(),
        proof_ack: prove(counterparty, &Path::connection(counterparty_connection_id)),
        proof_height,
    }
}

// --- channel handshake messages ---

pub fn chan_open_init_msg(connection_id: &ConnectionId, ordering: Order) -> MsgChannelOpenInit {
    MsgChannelOpenInit {
        port_id: PortId::transfer(),
        ordering,
        connection_hops: vec![connection_id.clone()],
        counterparty_port_id: PortId::transfer(),
        version: channel::Version::new(CHANNEL_VERSION),
    }
}

pub fn chan_open_try_msg(
    counterparty: &Host,
    connection_id: &ConnectionId,
    counterparty_channel_id: &ChannelId,
    proof_height: Height,
) -> MsgChannelOpenTry {
    let port_id = PortId::transfer();
    let end = counterparty.channel(&port_id, counterparty_channel_id).unwrap();
    MsgChannelOpenTry {
        port_id: end.counterparty.port_id.clone(),
        ordering: end.ordering,
        connection_hops: vec![connection_id.clone()],
        counterparty: channel::Counterparty {
            port_id: port_id.clone(),
            channel_id: Some(counterparty_channel_id.clone()),
        },
        counterparty_version: end.version,
        proof_init: prove(counterparty, &Path::channel_end(&port_id, counterparty_channel_id)),
        proof_height,
    }
}

pub fn chan_open_ack_msg(
    counterparty: &Host,
    channel_id: &ChannelId,
    counterparty_channel_id: &ChannelId,
    proof_height: Height,
) -> MsgChannelOpenAck {
    let port_id = PortId::transfer();
    let end = counterparty.channel(&port_id, counterparty_channel_id).unwrap();
    MsgChannelOpenAck {
        port_id: port_id.clone(),
        channel_id: channel_id.clone(),
        counterparty_channel_id: counterparty_channel_id.clone(),
        counterparty_version: end.version,
        proof_try: prove(counterparty, &Path::channel_end(&port_id, counterparty_channel_id)),
        proof_height,
    }
}

pub fn chan_open_confirm_msg(
    counterparty: &Host,
    channel_id: &ChannelId,
    counterparty_channel_id: &ChannelId,
    proof_height: Height,
) -> MsgChannelOpenConfirm {
    let port_id = PortId::transfer();
    MsgChannelOpenConfirm {
        port_id: port_id.clone(),
        channel_id: channel_id.clone(),
        proof_ack: prove(counterparty, &Path::channel_end(&port_id, counterparty_channel_id)),
        proof_height,
    }
}

pub fn chan_close_confirm_msg(
    counterparty: &Host,
    channel_id: &ChannelId,
    counterparty_channel_id: &ChannelId,
    proof_height: Height,
) -> MsgChannelCloseConfirm {
    let port_id = PortId::transfer();
    MsgChannelCloseConfirm {
        port_id: port_id.clone(),
        channel_id: channel_id.clone(),
        proof_init: prove(counterparty, &Path::channel_end(&port_id, counterparty_channel_id)),
        proof_height,
    }
}

// --- packets ---

pub fn packet(sequence: u64, source: &ChannelId, destination: &ChannelId) -> Packet {
    Packet {
        sequence: Sequence::from(sequence),
        source_port: PortId::transfer(),
        source_channel: source.clone(),
        destination_port: PortId::transfer(),
        destination_channel: destination.clone(),
        data: format!("packet {sequence}").into_bytes(),
        timeout_height: Height::new(0, 100),
        timeout_timestamp: 0,
    }
}

pub fn recv_packet_msg(
    counterparty: &Host,
    packet: &Packet,
    proof_height: Height,
) -> MsgRecvPacket {
    MsgRecvPacket {
        packet: packet.clone(),
        proof_commitment: prove(
            counterparty,
            &Path::commitment(&packet.source_port, &packet.source_channel, packet.sequence),
        ),
        proof_height,
        relayer: addresses::RELAYER.address(),
    }
}

pub fn ack_packet_msg(
    counterparty: &Host,
    packet: &Packet,
    ack: &[u8],
    proof_height: Height,
) -> MsgAcknowledgement {
    MsgAcknowledgement {
        packet: packet.clone(),
        acknowledgement: ack.to_vec().into(),
        proof_acked: prove(
            counterparty,
            &Path::ack(
                &packet.destination_port,
                &packet.destination_channel,
                packet.sequence,
            ),
        ),
        proof_height,
        relayer: addresses::RELAYER.address(),
    }
}

/// Timeout message for `packet`, proving the counterparty state relevant to
/// the ordering of the channel.
pub fn timeout_msg(
    counterparty: &Host,
    packet: &Packet,
    ordering: Order,
    proof_height: Height,
) -> MsgTimeout {
    let (port_id, channel_id) = (&packet.destination_port, &packet.destination_channel);
    let (next_sequence_recv, proof_unreceived) = match ordering {
        Order::Ordered => (
            counterparty
                .next_sequence_recv(port_id, channel_id)
                .unwrap()
                .value(),
            prove(counterparty, &Path::seq_recv(port_id, channel_id)),
        ),
        Order::Unordered => (
            0,
            prove(counterparty, &Path::receipt(port_id, channel_id, packet.sequence)),
        ),
    };
    MsgTimeout {
        packet: packet.clone(),
        next_sequence_recv,
        proof_unreceived,
        proof_height,
        relayer: addresses::RELAYER.address(),
    }
}

// --- loopback handshakes ---

/// Open a connection between two ends living on the same chain, both
/// tracked by `client_id`. Returns the initiator and responder ids.
pub fn open_loopback_connection(
    chain: &mut Chain,
    client_id: &ClientId) -> (ConnectionId, ConnectionId,
) {
    let init = chain
        .host
        .connection_open_init(conn_open_init_msg(client_id, client_id))
        .unwrap();

    let proof_height = chain.proof_height(client_id);
    let msg = conn_open_try_msg(&chain.host, &init, proof_height);
    let try_ = chain.host.connection_open_try(msg).unwrap();

    let msg = conn_open_ack_msg(&chain.host, &init, &try_, proof_height);
    chain.host.connection_open_ack(msg).unwrap();

    let msg = conn_open_confirm_msg(&chain.host, &try_, &init, proof_height);
    chain.host.connection_open_confirm(msg).unwrap();

    (init, try_)
}

/// Open a channel on top of a loopback connection. Returns the initiator
/// and responder channel ids.
pub fn open_loopback_channel(
    chain: &mut Chain,
    client_id: &ClientId,
    (conn_init, conn_try): (&ConnectionId, &ConnectionId),
    ordering: Order,
) -> (ChannelId, ChannelId) {
    let proof_height = chain.proof_height(client_id);

    let init = chain
        .host
        .channel_open_init(chan_open_init_msg(conn_init, ordering))
        .unwrap();

    let msg = chan_open_try_msg(&chain.host, conn_try, &init, proof_height);
    let try_ = chain.host.channel_open_try(msg).unwrap();

    let msg = chan_open_ack_msg(&chain.host, &init, &try_, proof_height);
    chain.host.channel_open_ack(msg).unwrap();

    let msg = chan_open_confirm_msg(&chain.host, &try_, &init, proof_height);
    chain.host.channel_open_confirm(msg).unwrap();

    (init, try_)
}

/// A chain with a loopback channel of the given ordering already open.
pub struct Loopback {
    pub chain: Chain,
    pub client_id: ClientId,
    pub connections: (ConnectionId, ConnectionId),
    pub channels: (ChannelId, ChannelId),
}

impl Loopback {
    pub fn new(ordering: Order) -> Self {
        let mut chain = Chain::new();
        let client_id = chain.create_client();
        let connections = open_loopback_connection(&mut chain, &client_id);
        let channels = open_loopback_channel(
            &mut chain,
            &client_id,
            (&connections.0, &connections.1),
            ordering,
        );
        chain.host.take_events();

        Self {
            chain,
            client_id,
            connections,
            channels,
        }
    }

    pub fn proof_height(&self) -> Height {
        self.chain.proof_height(&self.client_id)
    }

    /// Packet travelling from the initiator channel to the responder.
    pub fn packet(&self, sequence: u64) -> Packet {
        packet(sequence, &self.channels.0, &self.channels.1)
    }

    pub fn send(&mut self, packet: &Packet) -> Sequence {
        self.chain
            .host
            .send_packet(&addresses::MODULE.address(), packet.clone())
            .unwrap()
    }

    pub fn recv(&mut self, packet: &Packet) -> Result<(), crate::IbcError> {
        let msg = recv_packet_msg(&self.chain.host, packet, self.proof_height());
        self.chain.host.recv_packet(msg)
    }

    pub fn acknowledge(&mut self, packet: &Packet, ack: &[u8]) -> Result<(), crate::IbcError> {
        let msg = ack_packet_msg(&self.chain.host, packet, ack, self.proof_height());
        self.chain.host.acknowledge_packet(msg)
    }
}
