//! Typed accessors over the host's key-value store.
//!
//! The store is split into three namespaces:
//!
//! - `ibc/records`: protocol records (client bindings, connection and
//!   channel ends, counters), keyed by their ICS-24 path string.
//! - `ibc/commitments`: the provable commitment store, mapping
//!   `keccak256(path)` to `keccak256(value)` or to a receipt marker.
//! - `ibc/capabilities`: `keccak256(name)` to the owning module address.

use borsh::{BorshDeserialize, BorshSerialize};
use ibc_engine_commitment::{commitment_key, keccak256, Hash, Path, RECEIPT_MARKER};
use ibc_engine_store::{NamespacedStore, ReadStore, Store};
use ibc_engine_types::channel::ChannelEnd;
use ibc_engine_types::connection::ConnectionEnd;
use ibc_engine_types::{
    Address, ChannelId, ClientId, ClientType, ConnectionId, IbcError, PortId, Sequence,
};

use crate::client::ClientRecord;

const RECORDS: &str = "ibc/records";
const COMMITMENTS: &str = "ibc/commitments";
const CAPABILITIES: &str = "ibc/capabilities";

const NEXT_CONNECTION_SEQUENCE: &str = "nextConnectionSequence";
const NEXT_CHANNEL_SEQUENCE: &str = "nextChannelSequence";

/// Namespace of the store slice handed to the light client at `address`.
pub fn light_client_namespace(address: &Address) -> String {
    format!("lightclients/{address}")
}

/// Namespace of the store slice handed to the module at `address`.
pub fn module_namespace(address: &Address) -> String {
    format!("modules/{address}")
}

fn client_type_key(client_type: &ClientType) -> String {
    format!("clientTypes/{client_type}")
}

fn next_client_sequence_key(client_type: &ClientType) -> String {
    format!("nextClientSequence/{client_type}")
}

fn client_key(client_id: &ClientId) -> String {
    format!("clients/{client_id}")
}

/// IBC state, layered over some store.
#[derive(Debug)]
pub struct IbcState<S> {
    store: S,
}

impl<S> IbcState<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ReadStore> IbcState<S> {
    fn record<T: BorshDeserialize>(
        &self,
        key: &str,
        what: &'static str,
    ) -> Result<Option<T>, IbcError> {
        let bytes = NamespacedStore::new(RECORDS, &self.store)
            .read(key.as_bytes())
            .map_err(IbcError::Store)?;
        bytes
            .map(|bytes| {
                borsh::from_slice(&bytes).map_err(|err| IbcError::Decode {
                    what,
                    reason: err.to_string(),
                })
            })
            .transpose()
    }

    fn has_record(&self, key: &str) -> Result<bool, IbcError> {
        NamespacedStore::new(RECORDS, &self.store)
            .has(key.as_bytes())
            .map_err(IbcError::Store)
    }

    fn counter(&self, key: &str) -> Result<u64, IbcError> {
        Ok(self.record(key, "counter")?.unwrap_or(0))
    }

    fn sequence(&self, path: &Path) -> Result<Sequence, IbcError> {
        Ok(self
            .record::<u64>(&path.to_string(), "sequence")?
            .unwrap_or(1)
            .into())
    }

    /// Raw value stored in the commitment store at `path`.
    pub fn commitment(&self, path: &Path) -> Result<Option<Vec<u8>>, IbcError> {
        NamespacedStore::new(COMMITMENTS, &self.store)
            .read(&commitment_key(path))
            .map_err(IbcError::Store)
    }

    pub fn has_commitment(&self, path: &Path) -> Result<bool, IbcError> {
        NamespacedStore::new(COMMITMENTS, &self.store)
            .has(&commitment_key(path))
            .map_err(IbcError::Store)
    }

    /// Light client address bound to `client_type`.
    pub fn client_type_binding(
        &self,
        client_type: &ClientType,
    ) -> Result<Option<Address>, IbcError> {
        self.record(&client_type_key(client_type), "light client address")
    }

    pub fn next_client_sequence(&self, client_type: &ClientType) -> Result<u64, IbcError> {
        self.counter(&next_client_sequence_key(client_type))
    }

    pub fn client(&self, client_id: &ClientId) -> Result<Option<ClientRecord>, IbcError> {
        self.record(&client_key(client_id), "client record")
    }

    pub fn connection(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<ConnectionEnd>, IbcError> {
        self.record(&Path::connection(connection_id).to_string(), "connection end")
    }

    pub fn next_connection_sequence(&self) -> Result<u64, IbcError> {
        self.counter(NEXT_CONNECTION_SEQUENCE)
    }

    pub fn channel(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<Option<ChannelEnd>, IbcError> {
        self.record(&Path::channel_end(port_id, channel_id).to_string(), "channel end")
    }

    pub fn next_channel_sequence(&self) -> Result<u64, IbcError> {
        self.counter(NEXT_CHANNEL_SEQUENCE)
    }

    pub fn next_sequence_send(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<Sequence, IbcError> {
        self.sequence(&Path::seq_send(port_id, channel_id))
    }

    pub fn next_sequence_recv(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<Sequence, IbcError> {
        self.sequence(&Path::seq_recv(port_id, channel_id))
    }

    pub fn next_sequence_ack(
        &self,
        port_id: &PortId,
        channel_id: &ChannelId,
    ) -> Result<Sequence, IbcError> {
        self.sequence(&Path::seq_ack(port_id, channel_id))
    }

    pub fn is_port_tracked(&self, port_id: &PortId) -> Result<bool, IbcError> {
        self.has_record(&Path::port(port_id).to_string())
    }

    /// Owner of the capability `name`.
    pub fn capability(&self, name: &str) -> Result<Option<Address>, IbcError> {
        let bytes = NamespacedStore::new(CAPABILITIES, &self.store)
            .read(&keccak256(name.as_bytes()))
            .map_err(IbcError::Store)?;
        bytes
            .map(|bytes| {
                borsh::from_slice(&bytes).map_err(|err| IbcError::Decode {
                    what: "capability owner",
                    reason: err.to_string(),
                })
            })
            .transpose()
    }
}

impl<S: Store> IbcState<S> {
    fn set_record<T: BorshSerialize>(&mut self, key: &str, value: &T) -> Result<(), IbcError> {
        let bytes = borsh::to_vec(value).map_err(|err| IbcError::Store(Box::new(err)))?;
        NamespacedStore::new(RECORDS, &mut self.store)
            .write(key.as_bytes(), &bytes)
            .map_err(IbcError::Store)
    }

    fn set_sequence(&mut self, path: &Path, sequence: Sequence) -> Result<(), IbcError> {
        self.set_record(&path.to_string(), &sequence.value())
    }

    /// Store `hash` in the commitment store at `path`.
    pub fn set_commitment(&mut self, path: &Path, hash: &[u8]) -> Result<(), IbcError> {
        NamespacedStore::new(COMMITMENTS, &mut self.store)
            .write(&commitment_key(path), hash)
            .map_err(IbcError::Store)
    }

    /// Commit to `value` at `path`, i.e. store `keccak256(value)`.
    pub fn publish(&mut self, path: &Path, value: &[u8]) -> Result<Hash, IbcError> {
        let hash = keccak256(value);
        self.set_commitment(path, &hash)?;
        Ok(hash)
    }

    pub fn set_receipt(&mut self, path: &Path) -> Result<(), IbcError> {
        self.set_commitment(path, RECEIPT_MARKER)
    }

    pub fn delete_commitment(&mut self, path: &Path) -> Result<(), IbcError> {
        NamespacedStore::new(COMMITMENTS, &mut self.store)
            .delete(&commitment_key(path))
            .map_err(IbcError::Store)
    }

    pub fn set_client_type_binding(
        &mut self,
        client_type: &ClientType,
        address: &Address,
    ) -> Result<(), IbcError> {
        self.set_record(&client_type_key(client_type), address)
    }

    pub fn set_next_client_sequence(
        &mut self,
        client_type: &ClientType,
        sequence: u64,
    ) -> Result<(), IbcError> {
        self.set_record(&next_client_sequence_key(client_type), &sequence)
    }

    pub fn set_client(&mut self, record: &ClientRecord) -> Result<(), IbcError> {
        self.set_record(&client_key(&record.client_id), record)
    }

    /// Store `end` and publish its commitment.
    pub fn set_connection(
        &mut self,
        connection_id: &ConnectionId,
        end: &ConnectionEnd,
    ) -> Result<(), IbcError> {
        let path = Path::connection(connection_id);
        self.set_record(&path.to_string(), end)?;
        self.publish(&path, &end.encode())?;
        Ok(())
    }

    pub fn set_next_connection_sequence(&mut self, sequence: u64) -> Result<(), IbcError> {
        self.set_record(NEXT_CONNECTION_SEQUENCE, &sequence)
    }

    /// Store `end` and publish its commitment.
    pub fn set_channel(
        &mut self,
        port_id: &PortId,
        channel_id: &ChannelId,
        end: &ChannelEnd,
    ) -> Result<(), IbcError> {
        let path = Path::channel_end(port_id, channel_id);
        self.set_record(&path.to_string(), end)?;
        self.publish(&path, &end.encode())?;
        Ok(())
    }

    pub fn set_next_channel_sequence(&mut self, sequence: u64) -> Result<(), IbcError> {
        self.set_record(NEXT_CHANNEL_SEQUENCE, &sequence)
    }

    pub fn set_next_sequence_send(
        &mut self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
    ) -> Result<(), IbcError> {
        self.set_sequence(&Path::seq_send(port_id, channel_id), sequence)
    }

    /// Store the receive sequence and publish it, so that the counterparty
    /// can prove that an ordered packet was not received.
    pub fn set_next_sequence_recv(
        &mut self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
    ) -> Result<(), IbcError> {
        let path = Path::seq_recv(port_id, channel_id);
        self.set_sequence(&path, sequence)?;
        self.publish(&path, &sequence.to_be_bytes())?;
        Ok(())
    }

    pub fn set_next_sequence_ack(
        &mut self,
        port_id: &PortId,
        channel_id: &ChannelId,
        sequence: Sequence,
    ) -> Result<(), IbcError> {
        self.set_sequence(&Path::seq_ack(port_id, channel_id), sequence)
    }

    pub fn track_port(&mut self, port_id: &PortId) -> Result<(), IbcError> {
        self.set_record(&Path::port(port_id).to_string(), &())
    }

    pub fn set_capability(&mut self, name: &str, owner: &Address) -> Result<(), IbcError> {
        let bytes = borsh::to_vec(owner).map_err(|err| IbcError::Store(Box::new(err)))?;
        NamespacedStore::new(CAPABILITIES, &mut self.store)
            .write(&keccak256(name.as_bytes()), &bytes)
            .map_err(IbcError::Store)
    }
}

#[cfg(test)]
mod tests {
    use ibc_engine_store::MemoryStore;

    use super::*;

    #[test]
    fn sequences_start_at_one() {
        let state = IbcState::new(MemoryStore::default());
        let port = PortId::transfer();
        let chan = ChannelId::new(0);

        assert_eq!(state.next_sequence_send(&port, &chan).unwrap(), 1.into());
        assert_eq!(state.next_sequence_recv(&port, &chan).unwrap(), 1.into());
        assert_eq!(state.next_sequence_ack(&port, &chan).unwrap(), 1.into());
        assert_eq!(state.next_connection_sequence().unwrap(), 0);
    }

    #[test]
    fn published_recv_sequence_is_provable() {
        let mut state = IbcState::new(MemoryStore::default());
        let port = PortId::transfer();
        let chan = ChannelId::new(0);

        state
            .set_next_sequence_recv(&port, &chan, 5.into())
            .unwrap();

        assert_eq!(state.next_sequence_recv(&port, &chan).unwrap(), 5.into());
        assert_eq!(
            state.commitment(&Path::seq_recv(&port, &chan)).unwrap(),
            Some(keccak256(&5u64.to_be_bytes()).to_vec())
        );
    }

    #[test]
    fn records_and_commitments_live_in_separate_namespaces() {
        let mut state = IbcState::new(MemoryStore::default());
        let path = Path::port(&PortId::transfer());

        state.track_port(&PortId::transfer()).unwrap();
        assert!(!state.has_commitment(&path).unwrap());

        state.set_receipt(&path).unwrap();
        assert_eq!(state.commitment(&path).unwrap(), Some(RECEIPT_MARKER.to_vec()));

        state.delete_commitment(&path).unwrap();
        assert!(!state.has_commitment(&path).unwrap());
        assert!(state.is_port_tracked(&PortId::transfer()).unwrap());
    }
}
