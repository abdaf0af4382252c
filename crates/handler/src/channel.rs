//! ICS-04 channel handshake and closing.

use ibc_engine_commitment::Path;
use ibc_engine_store::{ReadStore, Store};
use ibc_engine_types::channel::{ChannelEnd, ChannelState, Counterparty, Order};
use ibc_engine_types::connection::ConnectionEnd;
use ibc_engine_types::msgs::{
    MsgChannelCloseConfirm, MsgChannelCloseInit, MsgChannelOpenAck, MsgChannelOpenConfirm,
    MsgChannelOpenInit, MsgChannelOpenTry,
};
use ibc_engine_types::{ChannelId, ConnectionId, IbcError, PortId, Sequence};
use tracing::info;

use crate::context::{Context, Proof};
use crate::events::{ChannelAttributes, IbcEvent};

const NO_DELAY: u64 = 0;

impl<S: ReadStore> Context<'_, S> {
    pub fn channel_end(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<ChannelEnd, IbcError> {
        self.state
            .channel(port_id, channel_id)?
            .ok_or_else(|| IbcError::ChannelNotFound {
                port_id: port_id.clone(),
                channel_id: channel_id.clone(),
            })
    }

    /// Connection a channel end is built on, which must be open.
    pub(crate) fn channel_connection(
        &self,
        end: &ChannelEnd,
    ) -> Result<(ConnectionId, ConnectionEnd), IbcError> {
        let connection_id = end
            .connection_id()
            .ok_or(IbcError::InvalidConnectionHops {
                hops: end.connection_hops.len(),
            })?
            .clone();
        let connection = self.open_connection_end(&connection_id)?;
        Ok((connection_id, connection))
    }

    /// Open connection a new channel may be built on.
    fn handshake_connection(
        &self,
        connection_hops: &[ConnectionId],
        ordering: Order,
    ) -> Result<(ConnectionId, ConnectionEnd), IbcError> {
        let [connection_id] = connection_hops else {
            return Err(IbcError::InvalidConnectionHops {
                hops: connection_hops.len(),
            });
        };
        let connection = self.open_connection_end(connection_id)?;

        let feature = ordering.as_feature();
        if !connection
            .versions
            .iter()
            .any(|version| version.supports_feature(feature))
        {
            return Err(IbcError::UnsupportedOrdering {
                ordering: feature.to_owned(),
                connection_id: connection_id.clone(),
            });
        }
        Ok((connection_id.clone(), connection))
    }
}

impl<S: Store> Context<'_, S> {
    fn next_channel_id(&mut self, port_id: &PortId) -> Result<ChannelId, IbcError> {
        let sequence = self.state.next_channel_sequence()?;
        let channel_id = ChannelId::new(sequence);
        if self.state.channel(port_id, &channel_id)?.is_some() {
            return Err(IbcError::ChannelAlreadyExists {
                port_id: port_id.clone(),
                channel_id,
            });
        }
        let next_sequence = sequence.checked_add(1).ok_or(IbcError::SequenceOverflow)?;
        self.state.set_next_channel_sequence(next_sequence)?;
        Ok(channel_id)
    }

    /// Store a freshly opened channel end, reset its sequences and hand
    /// its capability to the module bound to `port_id`.
    fn create_channel(
        &mut self,
        port_id: &PortId,
        channel_id: &ChannelId,
        end: &ChannelEnd,
    ) -> Result<(), IbcError> {
        self.state.set_channel(port_id, channel_id, end)?;

        let first = Sequence::from(1);
        self.state.set_next_sequence_send(port_id, channel_id, first)?;
        self.state.set_next_sequence_recv(port_id, channel_id, first)?;
        self.state.set_next_sequence_ack(port_id, channel_id, first)?;

        let module = self.lookup_module(&Path::port(port_id).to_string())?;
        self.claim_capability(&Path::channel_capability(port_id, channel_id).to_string(), &module)
    }

    pub fn channel_open_init(&mut self, msg: MsgChannelOpenInit) -> Result<ChannelId, IbcError> {
        let (connection_id, _) = self.handshake_connection(&msg.connection_hops, msg.ordering)?;
        let port_capability = Path::port(&msg.port_id).to_string();
        self.lookup_module(&port_capability)?;

        let channel_id = self.next_channel_id(&msg.port_id)?;
        let counterparty = Counterparty {
            port_id: msg.counterparty_port_id,
            channel_id: None,
        };

        let version = self.with_module(&port_capability, |module, store| {
            module.on_chan_open_init(
                store,
                msg.ordering,
                &msg.connection_hops,
                &msg.port_id,
                &channel_id,
                &counterparty,
                &msg.version,
            )
        })?;

        let end = ChannelEnd {
            state: ChannelState::Init,
            ordering: msg.ordering,
            counterparty,
            connection_hops: msg.connection_hops,
            version,
        };
        self.create_channel(&msg.port_id, &channel_id, &end)?;

        info!(port_id = %msg.port_id, %channel_id, version = %end.version, "channel init");
        self.emit(IbcEvent::ChannelOpenInit {
            channel: channel_attributes(&msg.port_id, &channel_id, &connection_id, &end),
            version: end.version.clone(),
        });
        Ok(channel_id)
    }

    pub fn channel_open_try(&mut self, msg: MsgChannelOpenTry) -> Result<ChannelId, IbcError> {
        let (connection_id, connection) =
            self.handshake_connection(&msg.connection_hops, msg.ordering)?;
        let counterparty_channel_id = msg.counterparty.channel_id.clone().ok_or(
            IbcError::MissingCounterpartyId {
                what: "channel id",
            },
        )?;
        let port_capability = Path::port(&msg.port_id).to_string();
        self.lookup_module(&port_capability)?;

        let expected = expected_counterparty_channel(
            &ChannelEnd {
                state: ChannelState::Init,
                ordering: msg.ordering,
                counterparty: msg.counterparty.clone(),
                connection_hops: msg.connection_hops.clone(),
                version: msg.counterparty_version.clone(),
            },
            &msg.port_id,
            None,
            &connection,
        )?;
        self.verify_membership(
            &connection,
            NO_DELAY,
            Proof::new(&msg.proof_init, msg.proof_height),
            &Path::channel_end(&msg.counterparty.port_id, &counterparty_channel_id),
            &expected.encode(),
        )?;

        let channel_id = self.next_channel_id(&msg.port_id)?;
        let version = self.with_module(&port_capability, |module, store| {
            module.on_chan_open_try(
                store,
                msg.ordering,
                &msg.connection_hops,
                &msg.port_id,
                &channel_id,
                &msg.counterparty,
                &msg.counterparty_version,
            )
        })?;

        let end = ChannelEnd {
            state: ChannelState::TryOpen,
            ordering: msg.ordering,
            counterparty: msg.counterparty,
            connection_hops: msg.connection_hops,
            version,
        };
        self.create_channel(&msg.port_id, &channel_id, &end)?;

        info!(port_id = %msg.port_id, %channel_id, version = %end.version, "channel try");
        self.emit(IbcEvent::ChannelOpenTry {
            channel: channel_attributes(&msg.port_id, &channel_id, &connection_id, &end),
            version: end.version.clone(),
        });
        Ok(channel_id)
    }

    pub fn channel_open_ack(&mut self, msg: MsgChannelOpenAck) -> Result<(), IbcError> {
        let mut end = self.channel_end(&msg.port_id, &msg.channel_id)?;
        ensure_channel_state(&msg.port_id, &msg.channel_id, &end, ChannelState::Init)?;
        let (connection_id, connection) = self.channel_connection(&end)?;

        end.counterparty.channel_id = Some(msg.counterparty_channel_id.clone());
        end.version = msg.counterparty_version.clone();

        let expected = expected_counterparty_channel(
            &ChannelEnd {
                state: ChannelState::TryOpen,
                ..end.clone()
            },
            &msg.port_id,
            Some(&msg.channel_id),
            &connection,
        )?;
        self.verify_membership(
            &connection,
            NO_DELAY,
            Proof::new(&msg.proof_try, msg.proof_height),
            &Path::channel_end(&end.counterparty.port_id, &msg.counterparty_channel_id),
            &expected.encode(),
        )?;

        self.with_module(&Path::port(&msg.port_id).to_string(), |module, store| {
            module.on_chan_open_ack(
                store,
                &msg.port_id,
                &msg.channel_id,
                &msg.counterparty_channel_id,
                &msg.counterparty_version,
            )
        })?;

        end.state = ChannelState::Open;
        self.state.set_channel(&msg.port_id, &msg.channel_id, &end)?;

        info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel open");
        self.emit(IbcEvent::ChannelOpenAck(channel_attributes(
            &msg.port_id,
            &msg.channel_id,
            &connection_id,
            &end,
        )));
        Ok(())
    }

    pub fn channel_open_confirm(&mut self, msg: MsgChannelOpenConfirm) -> Result<(), IbcError> {
        let mut end = self.channel_end(&msg.port_id, &msg.channel_id)?;
        ensure_channel_state(&msg.port_id, &msg.channel_id, &end, ChannelState::TryOpen)?;
        let (connection_id, connection) = self.channel_connection(&end)?;
        let counterparty_channel_id = counterparty_channel_id(&end)?;

        let expected = expected_counterparty_channel(
            &ChannelEnd {
                state: ChannelState::Open,
                ..end.clone()
            },
            &msg.port_id,
            Some(&msg.channel_id),
            &connection,
        )?;
        self.verify_membership(
            &connection,
            NO_DELAY,
            Proof::new(&msg.proof_ack, msg.proof_height),
            &Path::channel_end(&end.counterparty.port_id, &counterparty_channel_id),
            &expected.encode(),
        )?;

        self.with_module(&Path::port(&msg.port_id).to_string(), |module, store| {
            module.on_chan_open_confirm(store, &msg.port_id, &msg.channel_id)
        })?;

        end.state = ChannelState::Open;
        self.state.set_channel(&msg.port_id, &msg.channel_id, &end)?;

        info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel open");
        self.emit(IbcEvent::ChannelOpenConfirm(channel_attributes(
            &msg.port_id,
            &msg.channel_id,
            &connection_id,
            &end,
        )));
        Ok(())
    }

    pub fn channel_close_init(&mut self, msg: MsgChannelCloseInit) -> Result<(), IbcError> {
        let mut end = self.channel_end(&msg.port_id, &msg.channel_id)?;
        ensure_channel_state(&msg.port_id, &msg.channel_id, &end, ChannelState::Open)?;
        let (connection_id, _) = self.channel_connection(&end)?;

        self.with_module(&Path::port(&msg.port_id).to_string(), |module, store| {
            module.on_chan_close_init(store, &msg.port_id, &msg.channel_id)
        })?;

        end.state = ChannelState::Closed;
        self.state.set_channel(&msg.port_id, &msg.channel_id, &end)?;

        info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel closed");
        self.emit(IbcEvent::ChannelCloseInit(channel_attributes(
            &msg.port_id,
            &msg.channel_id,
            &connection_id,
            &end,
        )));
        Ok(())
    }

    pub fn channel_close_confirm(&mut self, msg: MsgChannelCloseConfirm) -> Result<(), IbcError> {
        let mut end = self.channel_end(&msg.port_id, &msg.channel_id)?;
        ensure_channel_state(&msg.port_id, &msg.channel_id, &end, ChannelState::Open)?;
        let (connection_id, connection) = self.channel_connection(&end)?;
        let counterparty_channel_id = counterparty_channel_id(&end)?;

        let expected = expected_counterparty_channel(
            &ChannelEnd {
                state: ChannelState::Closed,
                ..end.clone()
            },
            &msg.port_id,
            Some(&msg.channel_id),
            &connection,
        )?;
        self.verify_membership(
            &connection,
            NO_DELAY,
            Proof::new(&msg.proof_init, msg.proof_height),
            &Path::channel_end(&end.counterparty.port_id, &counterparty_channel_id),
            &expected.encode(),
        )?;

        self.with_module(&Path::port(&msg.port_id).to_string(), |module, store| {
            module.on_chan_close_confirm(store, &msg.port_id, &msg.channel_id)
        })?;

        end.state = ChannelState::Closed;
        self.state.set_channel(&msg.port_id, &msg.channel_id, &end)?;

        info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel closed");
        self.emit(IbcEvent::ChannelCloseConfirm(channel_attributes(
            &msg.port_id,
            &msg.channel_id,
            &connection_id,
            &end,
        )));
        Ok(())
    }
}

pub(crate) fn ensure_channel_state(
    port_id: &PortId,
    channel_id: &ChannelId,
    end: &ChannelEnd,
    expected: ChannelState,
) -> Result<(), IbcError> {
    if end.state != expected {
        return Err(IbcError::InvalidChannelState {
            port_id: port_id.clone(),
            channel_id: channel_id.clone(),
            expected,
            actual: end.state,
        });
    }
    Ok(())
}

fn counterparty_channel_id(end: &ChannelEnd) -> Result<ChannelId, IbcError> {
    end.counterparty
        .channel_id
        .clone()
        .ok_or(IbcError::MissingCounterpartyId { what: "channel id" })
}

/// Mirror of the local channel `end`, as the counterparty is expected to
/// store it. `end` must already carry the state expected on the other side.
fn expected_counterparty_channel(
    end: &ChannelEnd,
    port_id: &PortId,
    channel_id: Option<&ChannelId>,
    connection: &ConnectionEnd,
) -> Result<ChannelEnd, IbcError> {
    let counterparty_connection_id = connection.counterparty.connection_id.clone().ok_or(
        IbcError::MissingCounterpartyId {
            what: "connection id",
        },
    )?;
    Ok(ChannelEnd {
        state: end.state,
        ordering: end.ordering,
        counterparty: Counterparty {
            port_id: port_id.clone(),
            channel_id: channel_id.cloned(),
        },
        connection_hops: vec![counterparty_connection_id],
        version: end.version.clone(),
    })
}

fn channel_attributes(
    port_id: &PortId,
    channel_id: &ChannelId,
    connection_id: &ConnectionId,
    end: &ChannelEnd,
) -> ChannelAttributes {
    ChannelAttributes {
        port_id: port_id.clone(),
        channel_id: channel_id.clone(),
        counterparty_port_id: end.counterparty.port_id.clone(),
        counterparty_channel_id: end.counterparty.channel_id.clone(),
        connection_id: connection_id.clone(),
    }
}
