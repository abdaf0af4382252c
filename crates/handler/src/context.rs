//! Execution context of a single transaction.

use std::collections::BTreeMap;

use ibc_engine_commitment::Path;
use ibc_engine_module::{IbcModule, LightClient, ProofContext};
use ibc_engine_store::{NamespacedStore, ReadStore, Store};
use ibc_engine_types::connection::ConnectionEnd;
use ibc_engine_types::{Address, BoxError, ClientId, Height, IbcError};
use serde::{Deserialize, Serialize};

use crate::client::ClientRecord;
use crate::config::HostConfig;
use crate::events::IbcEvent;
use crate::state::{light_client_namespace, module_namespace, IbcState};

/// Light clients deployed into the host, by address.
pub type LightClients = BTreeMap<Address, Box<dyn LightClient>>;

/// Application modules deployed into the host, by address.
pub type Modules = BTreeMap<Address, Box<dyn IbcModule>>;

/// Height and time of the block being executed by the host.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: Height,
    /// Unix time in nanoseconds.
    pub timestamp: u64,
}

/// A counterparty state proof, as submitted by a relayer.
#[derive(Copy, Clone, Debug)]
pub struct Proof<'a> {
    pub bytes: &'a [u8],
    /// Counterparty height the proof was generated at.
    pub height: Height,
}

impl<'a> Proof<'a> {
    pub fn new(bytes: &'a [u8], height: Height) -> Self {
        Self { bytes, height }
    }
}

/// IBC state plus everything an engine operation may call into.
pub struct Context<'a, S> {
    pub(crate) state: IbcState<S>,
    light_clients: &'a LightClients,
    modules: &'a Modules,
    pub(crate) config: &'a HostConfig,
    pub(crate) block: BlockInfo,
    events: Vec<IbcEvent>,
}

impl<'a, S> Context<'a, S> {
    pub fn new(
        store: S,
        light_clients: &'a LightClients,
        modules: &'a Modules,
        config: &'a HostConfig,
        block: BlockInfo,
    ) -> Self {
        Self {
            state: IbcState::new(store),
            light_clients,
            modules,
            config,
            block,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: IbcEvent) {
        self.events.push(event);
    }

    /// Tear down the context, returning its store and the events emitted
    /// so far.
    pub fn into_parts(self) -> (S, Vec<IbcEvent>) {
        (self.state.into_inner(), self.events)
    }

    pub(crate) fn is_light_client_deployed(&self, address: &Address) -> bool {
        self.light_clients.contains_key(address)
    }

    pub(crate) fn is_module_deployed(&self, address: &Address) -> bool {
        self.modules.contains_key(address)
    }

    fn light_client(&self, address: &Address) -> Result<&'a dyn LightClient, IbcError> {
        let light_clients: &'a LightClients = self.light_clients;
        light_clients
            .get(address)
            .map(|client| client.as_ref())
            .ok_or_else(|| IbcError::LightClientNotFound {
                address: address.clone(),
            })
    }

    fn module(&self, address: &Address) -> Result<&'a dyn IbcModule, IbcError> {
        let modules: &'a Modules = self.modules;
        modules
            .get(address)
            .map(|module| module.as_ref())
            .ok_or_else(|| IbcError::ModuleNotFound {
                name: address.to_string(),
            })
    }
}

impl<S: ReadStore> Context<'_, S> {
    pub fn client_record(&self, client_id: &ClientId) -> Result<ClientRecord, IbcError> {
        self.state
            .client(client_id)?
            .ok_or_else(|| IbcError::ClientNotFound {
                client_id: client_id.clone(),
            })
    }

    /// Run a read-only light client query against the client's store slice.
    pub(crate) fn query_client<T>(
        &self,
        client_id: &ClientId,
        query: impl FnOnce(&dyn LightClient, &dyn ReadStore) -> Result<T, BoxError>,
    ) -> Result<T, IbcError> {
        let record = self.client_record(client_id)?;
        let light_client = self.light_client(&record.light_client)?;
        let namespace = light_client_namespace(&record.light_client);
        let store = NamespacedStore::new(&namespace, self.state.inner());

        query(light_client, &store).map_err(IbcError::LightClient)
    }

    pub fn latest_height(&self, client_id: &ClientId) -> Result<Height, IbcError> {
        self.query_client(client_id, |client, store| {
            client.latest_height(store, client_id)
        })
    }

    pub fn client_timestamp_at(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<u64, IbcError> {
        self.query_client(client_id, |client, store| {
            client.timestamp_at_height(store, client_id, height)
        })
    }

    fn check_proof_height(
        &self,
        client_id: &ClientId,
        proof_height: Height,
    ) -> Result<(), IbcError> {
        let latest_height = self.latest_height(client_id)?;
        if proof_height > latest_height {
            return Err(IbcError::ProofHeightTooHigh {
                proof_height,
                latest_height,
            });
        }
        Ok(())
    }

    fn proof_context<'p>(
        &self,
        connection: &'p ConnectionEnd,
        delay_period: u64,
        proof: Proof<'p>,
        path: &'p [u8],
    ) -> ProofContext<'p> {
        ProofContext {
            height: proof.height,
            delay_time_period: delay_period,
            delay_block_period: self.config.delay_block_period(delay_period),
            proof: proof.bytes,
            prefix: &connection.counterparty.prefix,
            path,
        }
    }

    /// Verify that the counterparty of `connection` stores `value` at `path`.
    ///
    /// `delay_period` is zero for handshake proofs, and the connection's
    /// delay period for packet proofs.
    pub(crate) fn verify_membership(
        &self,
        connection: &ConnectionEnd,
        delay_period: u64,
        proof: Proof<'_>,
        path: &Path,
        value: &[u8],
    ) -> Result<(), IbcError> {
        let client_id = &connection.client_id;
        self.check_proof_height(client_id, proof.height)?;

        let path_str = path.to_string();
        let ctx = self.proof_context(connection, delay_period, proof, path_str.as_bytes());
        let verified = self
            .query_client(client_id, |client, store| {
                client.verify_membership(store, client_id, ctx, value)
            })
            .map_err(|err| proof_error(&path_str, err))?;

        if !verified {
            return Err(IbcError::proof_failed(path_str));
        }
        Ok(())
    }

    /// Verify that the counterparty of `connection` stores nothing at `path`.
    pub(crate) fn verify_non_membership(
        &self,
        connection: &ConnectionEnd,
        delay_period: u64,
        proof: Proof<'_>,
        path: &Path,
    ) -> Result<(), IbcError> {
        let client_id = &connection.client_id;
        self.check_proof_height(client_id, proof.height)?;

        let path_str = path.to_string();
        let ctx = self.proof_context(connection, delay_period, proof, path_str.as_bytes());
        let verified = self
            .query_client(client_id, |client, store| {
                client.verify_non_membership(store, client_id, ctx)
            })
            .map_err(|err| proof_error(&path_str, err))?;

        if !verified {
            return Err(IbcError::proof_failed(path_str));
        }
        Ok(())
    }
}

impl<S: Store> Context<'_, S> {
    /// Run a light client operation that may write to the client's store slice.
    pub(crate) fn execute_client<T>(
        &mut self,
        light_client: &Address,
        op: impl FnOnce(&dyn LightClient, &mut dyn Store) -> Result<T, BoxError>,
    ) -> Result<T, IbcError> {
        let client = self.light_client(light_client)?;
        let namespace = light_client_namespace(light_client);
        let mut store = NamespacedStore::new(&namespace, self.state.inner_mut());

        op(client, &mut store).map_err(IbcError::LightClient)
    }

    /// Dispatch a callback to the module owning the capability `name`.
    pub(crate) fn with_module<T>(
        &mut self,
        name: &str,
        callback: impl FnOnce(&dyn IbcModule, &mut dyn Store) -> Result<T, BoxError>,
    ) -> Result<T, IbcError> {
        let address = self.lookup_module(name)?;
        let module = self.module(&address)?;
        let namespace = module_namespace(&address);
        let mut store = NamespacedStore::new(&namespace, self.state.inner_mut());

        callback(module, &mut store).map_err(|reason| IbcError::Module {
            module: address,
            reason,
        })
    }
}

/// Light client errors raised while checking a proof count as failed proofs.
fn proof_error(path: &str, err: IbcError) -> IbcError {
    match err {
        IbcError::LightClient(reason) => IbcError::ProofVerificationFailed {
            path: path.to_owned(),
            reason: Some(reason),
        },
        other => other,
    }
}
