//! Currency movement contract and an in-memory implementation.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use millow_shared::types::{Address, Amount};
use tracing::error;

use super::error::CollaboratorError;

/// Atomic currency primitives. The escrow core never moves money any other way.
#[cfg_attr(test, mockall::automock)]
pub trait Treasury: Send + Sync {
    /// Adds `amount` to the account of `to`.
    fn credit(&self, to: &Address, amount: Amount) -> Result<(), CollaboratorError>;

    /// Removes `amount` from the account of `from`.
    ///
    /// Fails with `CollaboratorError::InsufficientFunds` if the balance is short.
    fn debit(&self, from: &Address, amount: Amount) -> Result<(), CollaboratorError>;
}

/// Moves `amount` from one account to another through a debit/credit pair.
///
/// If the credit leg fails, the debited amount is credited back to `from`
/// before the error is returned.
pub fn move_funds(
    treasury: &dyn Treasury,
    from: &Address,
    to: &Address,
    amount: Amount,
) -> Result<(), CollaboratorError> {
    treasury.debit(from, amount)?;

    if let Err(err) = treasury.credit(to, amount) {
        if let Err(restore_err) = treasury.credit(from, amount) {
            error!(
                from = %from,
                to = %to,
                amount = %amount,
                error = %restore_err,
                "Failed to restore debited funds"
            );
        }
        return Err(err);
    }

    Ok(())
}

/// Treasury backed by a process-local balance map.
#[derive(Debug, Default)]
pub struct InMemoryTreasury {
    balances: Mutex<HashMap<Address, Amount>>,
}

impl InMemoryTreasury {
    /// Creates a treasury with no balances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the balance held by `address`.
    #[must_use]
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .copied()
            .unwrap_or_default()
    }
}

impl Treasury for InMemoryTreasury {
    fn credit(&self, to: &Address, amount: Amount) -> Result<(), CollaboratorError> {
        let mut balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);
        let balance = balances.entry(to.clone()).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| CollaboratorError::BalanceOverflow(to.clone()))?;
        Ok(())
    }

    fn debit(&self, from: &Address, amount: Amount) -> Result<(), CollaboratorError> {
        let mut balances = self.balances.lock().unwrap_or_else(PoisonError::into_inner);
        let available = balances.get(from).copied().unwrap_or_default();
        let remaining =
            available
                .checked_sub(amount)
                .ok_or_else(|| CollaboratorError::InsufficientFunds {
                    address: from.clone(),
                    requested: amount,
                    available,
                })?;
        balances.insert(from.clone(), remaining);
        Ok(())
    }
}
