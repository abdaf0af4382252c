//! Client registry.

use borsh::{BorshDeserialize, BorshSerialize};
use ibc_engine_commitment::Path;
use ibc_engine_module::ClientUpdate;
use ibc_engine_store::{ReadStore, Store};
use ibc_engine_types::msgs::{MsgCreateClient, MsgUpdateClient};
use ibc_engine_types::{Address, ClientId, ClientType, Height, IbcError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::Context;
use crate::events::IbcEvent;

/// Binding of a client to the light client instance holding its state.
#[derive(
    Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct ClientRecord {
    pub client_id: ClientId,
    pub client_type: ClientType,
    /// Address the light client was deployed at when the client was
    /// created. Later re-registrations of the client type do not move
    /// existing clients.
    pub light_client: Address,
}

impl<S: ReadStore> Context<'_, S> {
    pub fn client_state(&self, client_id: &ClientId) -> Result<Option<Vec<u8>>, IbcError> {
        self.query_client(client_id, |client, store| {
            client.client_state(store, client_id)
        })
    }

    pub fn consensus_state(
        &self,
        client_id: &ClientId,
        height: Height,
    ) -> Result<Option<Vec<u8>>, IbcError> {
        self.query_client(client_id, |client, store| {
            client.consensus_state(store, client_id, height)
        })
    }
}

impl<S: Store> Context<'_, S> {
    /// Bind `client_type` to the light client deployed at `light_client`,
    /// replacing any previous binding.
    pub fn register_client(
        &mut self,
        caller: &Address,
        client_type: &ClientType,
        light_client: &Address,
    ) -> Result<(), IbcError> {
        if !self.config.is_admin(caller) {
            return Err(IbcError::Unauthorized {
                caller: caller.clone(),
                action: "register client types",
            });
        }
        if !self.is_light_client_deployed(light_client) {
            return Err(IbcError::LightClientNotFound {
                address: light_client.clone(),
            });
        }

        self.state.set_client_type_binding(client_type, light_client)?;

        info!(%client_type, %light_client, "registered client type");
        self.emit(IbcEvent::RegisterClient {
            client_type: client_type.clone(),
            light_client: light_client.clone(),
        });
        Ok(())
    }

    pub fn create_client(&mut self, msg: MsgCreateClient) -> Result<ClientId, IbcError> {
        let light_client = self
            .state
            .client_type_binding(&msg.client_type)?
            .ok_or_else(|| IbcError::UnknownClientType {
                client_type: msg.client_type.clone(),
            })?;

        let sequence = self.state.next_client_sequence(&msg.client_type)?;
        let client_id = msg.client_type.client_id(sequence)?;
        if self.state.client(&client_id)?.is_some() {
            return Err(IbcError::ClientAlreadyExists { client_id });
        }
        let next_sequence = sequence.checked_add(1).ok_or(IbcError::SequenceOverflow)?;
        self.state
            .set_next_client_sequence(&msg.client_type, next_sequence)?;

        let update = self.execute_client(&light_client, |client, store| {
            client.create_client(store, &client_id, &msg.client_state, &msg.consensus_state)
        })?;

        self.state.set_client(&ClientRecord {
            client_id: client_id.clone(),
            client_type: msg.client_type.clone(),
            light_client,
        })?;
        self.publish_client_update(&client_id, &update)?;

        let consensus_height = self.latest_height(&client_id)?;

        info!(%client_id, %consensus_height, "created client");
        self.emit(IbcEvent::CreateClient {
            client_id: client_id.clone(),
            client_type: msg.client_type,
            consensus_height,
        });
        Ok(client_id)
    }

    pub fn update_client(&mut self, msg: MsgUpdateClient) -> Result<(), IbcError> {
        let record = self.client_record(&msg.client_id)?;

        let update = self.execute_client(&record.light_client, |client, store| {
            client.update_client(store, &msg.client_id, &msg.client_message)
        })?;
        self.publish_client_update(&msg.client_id, &update)?;

        let consensus_heights: Vec<Height> = update
            .consensus_state_updates
            .iter()
            .map(|consensus| consensus.height)
            .collect();

        info!(client_id = %msg.client_id, ?consensus_heights, "updated client");
        self.emit(IbcEvent::UpdateClient {
            client_id: msg.client_id,
            consensus_heights,
        });
        Ok(())
    }

    /// Publish the client and consensus state commitments returned by a
    /// light client, so that counterparties can prove our view of them.
    fn publish_client_update(
        &mut self,
        client_id: &ClientId,
        update: &ClientUpdate,
    ) -> Result<(), IbcError> {
        self.state.set_commitment(
            &Path::client_state(client_id),
            &update.client_state_commitment,
        )?;
        for consensus in &update.consensus_state_updates {
            self.state.set_commitment(
                &Path::consensus_state(client_id, consensus.height),
                &consensus.consensus_state_commitment,
            )?;
        }
        Ok(())
    }
}
