//! ICS-03 connection handshake.

use ibc_engine_commitment::Path;
use ibc_engine_store::{ReadStore, Store};
use ibc_engine_types::connection::{
    pick_version, ConnectionEnd, ConnectionState, Counterparty,
};
use ibc_engine_types::msgs::{
    MsgConnectionOpenAck, MsgConnectionOpenConfirm, MsgConnectionOpenInit, MsgConnectionOpenTry,
};
use ibc_engine_types::{ClientId, ConnectionId, IbcError};
use tracing::info;

use crate::context::{Context, Proof};
use crate::events::{ConnectionAttributes, IbcEvent};

/// Handshake proofs are checked without any delay.
const NO_DELAY: u64 = 0;

impl<S: ReadStore> Context<'_, S> {
    pub fn connection_end(&self, connection_id: &ConnectionId) -> Result<ConnectionEnd, IbcError> {
        self.state
            .connection(connection_id)?
            .ok_or_else(|| IbcError::ConnectionNotFound {
                connection_id: connection_id.clone(),
            })
    }

    pub(crate) fn open_connection_end(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionEnd, IbcError> {
        let end = self.connection_end(connection_id)?;
        ensure_connection_state(connection_id, &end, ConnectionState::Open)?;
        Ok(end)
    }

    fn ensure_client_exists(&self, client_id: &ClientId) -> Result<(), IbcError> {
        if self.client_state(client_id)?.is_none() {
            return Err(IbcError::ClientNotFound {
                client_id: client_id.clone(),
            });
        }
        Ok(())
    }

    /// Connection end the counterparty is expected to store for the local
    /// `end`, once it has reached `state`.
    fn expected_counterparty_end(
        &self,
        connection_id: Option<&ConnectionId>,
        end: &ConnectionEnd,
        state: ConnectionState,
    ) -> ConnectionEnd {
        ConnectionEnd {
            client_id: end.counterparty.client_id.clone(),
            counterparty: Counterparty {
                client_id: end.client_id.clone(),
                connection_id: connection_id.cloned(),
                prefix: self.config.merkle_prefix(),
            },
            versions: end.versions.clone(),
            state,
            delay_period: end.delay_period,
        }
    }
}

impl<S: Store> Context<'_, S> {
    fn next_connection_id(&mut self) -> Result<ConnectionId, IbcError> {
        let sequence = self.state.next_connection_sequence()?;
        let connection_id = ConnectionId::new(sequence);
        if self.state.connection(&connection_id)?.is_some() {
            return Err(IbcError::ConnectionAlreadyExists { connection_id });
        }
        let next_sequence = sequence.checked_add(1).ok_or(IbcError::SequenceOverflow)?;
        self.state.set_next_connection_sequence(next_sequence)?;
        Ok(connection_id)
    }

    pub fn connection_open_init(
        &mut self,
        msg: MsgConnectionOpenInit,
    ) -> Result<ConnectionId, IbcError> {
        self.ensure_client_exists(&msg.client_id)?;
        if msg.counterparty.connection_id.is_some() {
            return Err(IbcError::CounterpartyConnectionIdSet);
        }

        let versions = match msg.version {
            Some(version) if self.config.supported_versions.contains(&version) => vec![version],
            Some(version) => {
                return Err(IbcError::UnsupportedVersion {
                    version: version.identifier,
                })
            }
            None => self.config.supported_versions.clone(),
        };

        let connection_id = self.next_connection_id()?;
        let end = ConnectionEnd {
            client_id: msg.client_id,
            counterparty: msg.counterparty,
            versions,
            state: ConnectionState::Init,
            delay_period: msg.delay_period,
        };
        self.state.set_connection(&connection_id, &end)?;

        info!(%connection_id, client_id = %end.client_id, "connection init");
        self.emit(IbcEvent::ConnectionOpenInit(connection_attributes(
            &connection_id,
            &end,
        )));
        Ok(connection_id)
    }

    pub fn connection_open_try(
        &mut self,
        msg: MsgConnectionOpenTry,
    ) -> Result<ConnectionId, IbcError> {
        if msg.counterparty_versions.is_empty() {
            return Err(IbcError::EmptyCounterpartyVersions);
        }
        let counterparty_connection_id = msg.counterparty.connection_id.clone().ok_or(
            IbcError::MissingCounterpartyId {
                what: "connection id",
            },
        )?;
        self.ensure_client_exists(&msg.client_id)?;

        let version = pick_version(&self.config.supported_versions, &msg.counterparty_versions)
            .ok_or(IbcError::NoCommonVersion)?;

        let end = ConnectionEnd {
            client_id: msg.client_id,
            counterparty: msg.counterparty,
            versions: vec![version],
            state: ConnectionState::TryOpen,
            delay_period: msg.delay_period,
        };

        let expected = ConnectionEnd {
            versions: msg.counterparty_versions,
            ..self.expected_counterparty_end(None, &end, ConnectionState::Init)
        };
        self.verify_membership(
            &end,
            NO_DELAY,
            Proof::new(&msg.proof_init, msg.proof_height),
            &Path::connection(&counterparty_connection_id),
            &expected.encode(),
        )?;
        self.verify_membership(
            &end,
            NO_DELAY,
            Proof::new(&msg.proof_client, msg.proof_height),
            &Path::client_state(&end.counterparty.client_id),
            &msg.client_state,
        )?;

        let connection_id = self.next_connection_id()?;
        self.state.set_connection(&connection_id, &end)?;

        info!(%connection_id, %counterparty_connection_id, "connection try");
        self.emit(IbcEvent::ConnectionOpenTry(connection_attributes(
            &connection_id,
            &end,
        )));
        Ok(connection_id)
    }

    pub fn connection_open_ack(&mut self, msg: MsgConnectionOpenAck) -> Result<(), IbcError> {
        let mut end = self.connection_end(&msg.connection_id)?;
        ensure_connection_state(&msg.connection_id, &end, ConnectionState::Init)?;
        if !end.versions.iter().any(|offered| msg.version.narrows(offered)) {
            return Err(IbcError::UnsupportedVersion {
                version: msg.version.identifier,
            });
        }

        end.versions = vec![msg.version];
        end.counterparty.connection_id = Some(msg.counterparty_connection_id.clone());

        let expected = self.expected_counterparty_end(
            Some(&msg.connection_id),
            &end,
            ConnectionState::TryOpen,
        );
        self.verify_membership(
            &end,
            NO_DELAY,
            Proof::new(&msg.proof_try, msg.proof_height),
            &Path::connection(&msg.counterparty_connection_id),
            &expected.encode(),
        )?;
        self.verify_membership(
            &end,
            NO_DELAY,
            Proof::new(&msg.proof_client, msg.proof_height),
            &Path::client_state(&end.counterparty.client_id),
            &msg.client_state,
        )?;

        end.state = ConnectionState::Open;
        self.state.set_connection(&msg.connection_id, &end)?;

        info!(
            connection_id = %msg.connection_id,
            counterparty_connection_id = %msg.counterparty_connection_id,
            "connection open"
        );
        self.emit(IbcEvent::ConnectionOpenAck(connection_attributes(
            &msg.connection_id,
            &end,
        )));
        Ok(())
    }

    pub fn connection_open_confirm(
        &mut self,
        msg: MsgConnectionOpenConfirm,
    ) -> Result<(), IbcError> {
        let mut end = self.connection_end(&msg.connection_id)?;
        ensure_connection_state(&msg.connection_id, &end, ConnectionState::TryOpen)?;
        let counterparty_connection_id = end.counterparty.connection_id.clone().ok_or(
            IbcError::MissingCounterpartyId {
                what: "connection id",
            },
        )?;

        let expected = self.expected_counterparty_end(
            Some(&msg.connection_id),
            &end,
            ConnectionState::Open,
        );
        self.verify_membership(
            &end,
            NO_DELAY,
            Proof::new(&msg.proof_ack, msg.proof_height),
            &Path::connection(&counterparty_connection_id),
            &expected.encode(),
        )?;

        end.state = ConnectionState::Open;
        self.state.set_connection(&msg.connection_id, &end)?;

        info!(connection_id = %msg.connection_id, "connection open");
        self.emit(IbcEvent::ConnectionOpenConfirm(connection_attributes(
            &msg.connection_id,
            &end,
        )));
        Ok(())
    }
}

fn ensure_connection_state(
    connection_id: &ConnectionId,
    end: &ConnectionEnd,
    expected: ConnectionState,
) -> Result<(), IbcError> {
    if end.state != expected {
        return Err(IbcError::InvalidConnectionState {
            connection_id: connection_id.clone(),
            expected,
            actual: end.state,
        });
    }
    Ok(())
}

fn connection_attributes(
    connection_id: &ConnectionId,
    end: &ConnectionEnd,
) -> ConnectionAttributes {
    ConnectionAttributes {
        connection_id: connection_id.clone(),
        client_id: end.client_id.clone(),
        counterparty_client_id: end.counterparty.client_id.clone(),
        counterparty_connection_id: end.counterparty.connection_id.clone(),
    }
}
