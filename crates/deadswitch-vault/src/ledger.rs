//! Per-asset balance book of the vault.
//!
//! Records are created on first credit and kept at zero afterwards.

use crate::asset::{Amount, AssetId};
use crate::vault::VaultError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recorded balance per asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultLedger {
    balances: BTreeMap<AssetId, Amount>,
}

impl VaultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded balance of `asset` (zero if never deposited).
    pub fn balance_of(&self, asset: AssetId) -> Amount {
        self.balances.get(&asset).copied().unwrap_or(0)
    }

    /// Whether `asset` has ever been credited.
    pub fn has_record(&self, asset: AssetId) -> bool {
        self.balances.contains_key(&asset)
    }

    /// Every asset record, including those at zero.
    pub fn balances(&self) -> impl Iterator<Item = (AssetId, Amount)> + '_ {
        self.balances.iter().map(|(asset, amount)| (*asset, *amount))
    }

    /// Balance after crediting `amount`, without writing it.
    pub(crate) fn checked_credit(
        &self,
        asset: AssetId,
        amount: Amount,
    ) -> Result<Amount, VaultError> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount(amount));
        }
        self.balance_of(asset)
            .checked_add(amount)
            .ok_or(VaultError::InvalidAmount(amount))
    }

    /// Balance after debiting `amount`, without writing it.
    pub(crate) fn checked_debit(
        &self,
        asset: AssetId,
        amount: Amount,
    ) -> Result<Amount, VaultError> {
        if amount == 0 {
            return Err(VaultError::InvalidAmount(amount));
        }
        let available = self.balance_of(asset);
        available
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientBalance {
                asset,
                available,
                requested: amount,
            })
    }

    /// Overwrite the record for `asset`, returning the previous amount.
    pub(crate) fn set(&mut self, asset: AssetId, amount: Amount) -> Amount {
        self.balances.insert(asset, amount).unwrap_or(0)
    }
}
