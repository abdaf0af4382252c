//! Capability and port registry.
//!
//! Capabilities are plain names (ICS-24 paths such as `ports/transfer`)
//! owned by exactly one module address. Owning a port capability routes
//! callbacks for that port to the module; owning a channel capability
//! authorizes the module to send packets and write acknowledgements on
//! that channel.

use ibc_engine_commitment::Path;
use ibc_engine_store::{ReadStore, Store};
use ibc_engine_types::{Address, IbcError, PortId};
use tracing::{debug, info};

use crate::context::Context;
use crate::events::IbcEvent;

impl<S: ReadStore> Context<'_, S> {
    /// Whether `caller` owns the capability `name`.
    pub fn authenticate_capability(&self, caller: &Address, name: &str) -> Result<bool, IbcError> {
        Ok(self.state.capability(name)?.as_ref() == Some(caller))
    }

    /// Address of the module owning the capability `name`.
    pub fn lookup_module(&self, name: &str) -> Result<Address, IbcError> {
        self.state
            .capability(name)?
            .ok_or_else(|| IbcError::ModuleNotFound {
                name: name.to_owned(),
            })
    }

    pub(crate) fn ensure_capability(&self, caller: &Address, name: &str) -> Result<(), IbcError> {
        if !self.authenticate_capability(caller, name)? {
            return Err(IbcError::CapabilityNotOwned {
                name: name.to_owned(),
                caller: caller.clone(),
            });
        }
        Ok(())
    }
}

impl<S: Store> Context<'_, S> {
    /// Start tracking `port_id`. Fails if the port is already owned.
    pub fn add_port_id(&mut self, port_id: &PortId) -> Result<(), IbcError> {
        let name = Path::port(port_id).to_string();
        if self.state.capability(&name)?.is_some() {
            return Err(IbcError::PortAlreadyBound {
                port_id: port_id.clone(),
            });
        }
        self.state.track_port(port_id)
    }

    /// Give ownership of `name` to `module`. Capabilities are claimed once.
    pub fn claim_capability(&mut self, name: &str, module: &Address) -> Result<(), IbcError> {
        if self.state.capability(name)?.is_some() {
            return Err(IbcError::CapabilityAlreadyClaimed {
                name: name.to_owned(),
            });
        }
        self.state.set_capability(name, module)?;

        debug!(capability = name, %module, "claimed capability");
        Ok(())
    }

    /// Bind `port_id` to the module deployed at `module`.
    pub fn bind_port(
        &mut self,
        caller: &Address,
        port_id: &PortId,
        module: &Address,
    ) -> Result<(), IbcError> {
        if !self.config.is_admin(caller) {
            return Err(IbcError::Unauthorized {
                caller: caller.clone(),
                action: "bind ports",
            });
        }
        if !self.is_module_deployed(module) {
            return Err(IbcError::ModuleNotFound {
                name: module.to_string(),
            });
        }

        self.add_port_id(port_id)?;
        self.claim_capability(&Path::port(port_id).to_string(), module)?;

        info!(%port_id, %module, "bound port");
        self.emit(IbcEvent::BindPort {
            port_id: port_id.clone(),
            module: module.clone(),
        });
        Ok(())
    }
}
