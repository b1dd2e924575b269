//! Per-listing authorization table.
//!
//! Every permission check in the escrow goes through this table instead of
//! comparing addresses inline.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use millow_shared::types::Address;
use serde::{Deserialize, Serialize};

use crate::error::EscrowError;

/// Role a party plays on a single listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Listed the asset and receives the purchase price.
    Seller,
    /// Records the inspection result.
    Inspector,
    /// Signs off on the financing.
    Lender,
    /// Deposited funds toward the purchase price.
    Contributor,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seller => "seller",
            Self::Inspector => "inspector",
            Self::Lender => "lender",
            Self::Contributor => "contributor",
        }
    }

}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of roles granted to addresses on one listing.
///
/// One address may hold several roles (a seller may also act as lender).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationTable {
    grants: BTreeMap<Address, BTreeSet<Role>>,
}

impl AuthorizationTable {
    /// Creates a table with the fixed listing parties.
    #[must_use]
    pub fn new(seller: &Address, inspector: &Address, lender: &Address) -> Self {
        let mut table = Self::default();
        table.grant(seller, Role::Seller);
        table.grant(inspector, Role::Inspector);
        table.grant(lender, Role::Lender);
        table
    }

    /// Grants `role` to `address`. Granting twice is a no-op.
    pub fn grant(&mut self, address: &Address, role: Role) {
        self.grants.entry(address.clone()).or_default().insert(role);
    }

    /// Returns true if `address` holds `role`.
    #[must_use]
    pub fn has_role(&self, address: &Address, role: Role) -> bool {
        self.grants
            .get(address)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Requires that `address` holds `role` for `operation`.
    pub fn require(
        &self,
        address: &Address,
        role: Role,
        operation: &'static str,
    ) -> Result<(), EscrowError> {
        self.require_any(address, &[role], operation)
    }

    /// Requires that `address` holds at least one of `roles` for `operation`.
    pub fn require_any(
        &self,
        address: &Address,
        roles: &[Role],
        operation: &'static str,
    ) -> Result<(), EscrowError> {
        if roles.iter().any(|role| self.has_role(address, *role)) {
            Ok(())
        } else {
            Err(EscrowError::UnauthorizedCaller {
                caller: address.clone(),
                operation,
            })
        }
    }

    /// Returns every address holding `role`, in address order.
    pub fn holders(&self, role: Role) -> impl Iterator<Item = &Address> {
        self.grants
            .iter()
            .filter(move |(_, roles)| roles.contains(&role))
            .map(|(address, _)| address)
    }
}
