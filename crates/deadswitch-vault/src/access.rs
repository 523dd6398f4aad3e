//! Two-role access control.
//!
//! Authorization is a pure lookup over (role, timer state, operation):
//!
//! ```text
//! operation   | ALIVE        | EXPIRED
//! ------------+--------------+-------------
//! heartbeat   | owner        | owner
//! deposit     | anyone       | anyone
//! withdraw    | owner        | beneficiary
//! ```

use crate::asset::Address;
use crate::timer::TimerState;
use crate::vault::VaultError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the vault sees a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Beneficiary,
    /// Any other identity
    Outsider,
}

/// Mutating operations gated by the access table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Heartbeat,
    Deposit,
    Withdraw,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Heartbeat => f.write_str("heartbeat"),
            Operation::Deposit => f.write_str("deposit"),
            Operation::Withdraw => f.write_str("withdraw"),
        }
    }
}

/// The decision table. Returns true iff `role` may perform `operation` in `state`.
pub fn authorize(role: Role, state: TimerState, operation: Operation) -> bool {
    use Operation::*;
    use Role::*;
    use TimerState::*;

    match (operation, state, role) {
        (Heartbeat, _, Owner) => true,
        (Heartbeat, _, _) => false,

        (Deposit, _, _) => true,

        (Withdraw, Alive, Owner) => true,
        (Withdraw, Expired, Beneficiary) => true,
        (Withdraw, _, _) => false,
    }
}

/// The owner and beneficiary of one vault. Both fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRoles")]
pub struct Roles {
    owner: Address,
    beneficiary: Address,
}

/// Unchecked wire form; deserialization goes through [`Roles::new`].
#[derive(Deserialize)]
struct RawRoles {
    owner: Address,
    beneficiary: Address,
}

impl TryFrom<RawRoles> for Roles {
    type Error = VaultError;

    fn try_from(raw: RawRoles) -> Result<Self, Self::Error> {
        Roles::new(raw.owner, raw.beneficiary)
    }
}

impl Roles {
    /// Owner and beneficiary must be distinct identities.
    pub fn new(owner: Address, beneficiary: Address) -> Result<Self, VaultError> {
        if owner == beneficiary {
            return Err(VaultError::RoleConflict);
        }
        Ok(Self { owner, beneficiary })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn beneficiary(&self) -> Address {
        self.beneficiary
    }

    pub fn role_of(&self, caller: Address) -> Role {
        if caller == self.owner {
            Role::Owner
        } else if caller == self.beneficiary {
            Role::Beneficiary
        } else {
            Role::Outsider
        }
    }

    /// Check `caller` against the table, producing `Unauthorized` on denial.
    pub fn check(
        &self,
        caller: Address,
        state: TimerState,
        operation: Operation,
    ) -> Result<Role, VaultError> {
        let role = self.role_of(caller);
        if authorize(role, state, operation) {
            Ok(role)
        } else {
            Err(VaultError::Unauthorized {
                caller,
                operation,
                state,
            })
        }
    }
}
