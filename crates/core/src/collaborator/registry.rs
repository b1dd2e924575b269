//! Asset registry contract and an in-memory implementation.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use millow_shared::types::{Address, AssetId};

use super::error::CollaboratorError;

/// Ownership registry for listed properties.
#[cfg_attr(test, mockall::automock)]
pub trait AssetRegistry: Send + Sync {
    /// Returns the current owner of the asset.
    fn owner_of(&self, asset_id: AssetId) -> Result<Address, CollaboratorError>;

    /// Moves the asset from `from` to `to`.
    ///
    /// Fails with `CollaboratorError::Authorization` if `from` is not the
    /// current owner.
    fn transfer_ownership(
        &self,
        asset_id: AssetId,
        from: &Address,
        to: &Address,
    ) -> Result<(), CollaboratorError>;
}

/// Registry backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    owners: Mutex<HashMap<AssetId, Address>>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new asset under `owner`, replacing any previous record.
    pub fn mint(&self, asset_id: AssetId, owner: Address) {
        self.owners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(asset_id, owner);
    }
}

impl AssetRegistry for InMemoryRegistry {
    fn owner_of(&self, asset_id: AssetId) -> Result<Address, CollaboratorError> {
        self.owners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&asset_id)
            .cloned()
            .ok_or(CollaboratorError::UnknownAsset(asset_id))
    }

    fn transfer_ownership(
        &self,
        asset_id: AssetId,
        from: &Address,
        to: &Address,
    ) -> Result<(), CollaboratorError> {
        let mut owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        let owner = owners
            .get_mut(&asset_id)
            .ok_or(CollaboratorError::UnknownAsset(asset_id))?;

        if owner != from {
            return Err(CollaboratorError::Authorization {
                asset_id,
                caller: from.clone(),
            });
        }

        *owner = to.clone();
        Ok(())
    }
}
