//! In-process asset ledger.
//!
//! Holds per-asset, per-holder balances in memory. The vault's custody
//! account is an ordinary holder (the `custodian`), so what the vault
//! records can be checked against what the ledger actually holds.

use crate::asset::{Address, Amount, AssetId, AssetLedger, TransferError};
use std::collections::BTreeMap;

/// Simple atomic asset ledger backed by ordered maps.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    custodian: Address,
    holdings: BTreeMap<AssetId, BTreeMap<Address, Amount>>,
    symbols: BTreeMap<Address, String>,
}

impl MemoryLedger {
    /// Create an empty ledger whose vault custody account is `custodian`.
    pub fn new(custodian: Address) -> Self {
        Self {
            custodian,
            holdings: BTreeMap::new(),
            symbols: BTreeMap::new(),
        }
    }

    /// The account holding assets on the vault's behalf.
    pub fn custodian(&self) -> Address {
        self.custodian
    }

    /// Record a token's ticker symbol.
    pub fn register_token(&mut self, token: Address, symbol: impl Into<String>) {
        self.symbols.insert(token, symbol.into());
    }

    /// Create `amount` of `asset` out of thin air for `holder`.
    pub fn mint(
        &mut self,
        asset: AssetId,
        holder: Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let current = self.balance(asset, holder);
        let updated = current
            .checked_add(amount)
            .ok_or(TransferError::Overflow { asset, holder })?;
        self.holdings
            .entry(asset)
            .or_default()
            .insert(holder, updated);
        Ok(())
    }

    /// Balance of `holder` in `asset` (zero if never seen).
    pub fn balance(&self, asset: AssetId, holder: Address) -> Amount {
        self.holdings
            .get(&asset)
            .and_then(|accounts| accounts.get(&holder))
            .copied()
            .unwrap_or(0)
    }

    /// Amount of `asset` held by the custodian.
    pub fn custody_balance(&self, asset: AssetId) -> Amount {
        self.balance(asset, self.custodian)
    }

    /// Move `amount` of `asset` between two distinct holders, all or nothing.
    pub fn transfer(
        &mut self,
        asset: AssetId,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        // A self-transfer would report success without moving anything
        if from == to {
            return Err(TransferError::Rejected(format!(
                "{} cannot transfer {} to itself",
                from, asset
            )));
        }
        let available = self.balance(asset, from);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                asset,
                holder: from,
                available,
                requested: amount,
            });
        }

        // Compute both sides before writing either
        let debited = available - amount;
        let credited = self
            .balance(asset, to)
            .checked_add(amount)
            .ok_or(TransferError::Overflow { asset, holder: to })?;

        let accounts = self.holdings.entry(asset).or_default();
        accounts.insert(from, debited);
        accounts.insert(to, credited);
        Ok(())
    }
}

impl AssetLedger for MemoryLedger {
    fn transfer_in(
        &mut self,
        asset: AssetId,
        from: Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        self.transfer(asset, from, self.custodian, amount)
    }

    fn transfer_out(
        &mut self,
        asset: AssetId,
        to: Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        self.transfer(asset, self.custodian, to, amount)
    }

    fn symbol(&self, asset: AssetId) -> Option<String> {
        asset
            .token_address()
            .and_then(|token| self.symbols.get(&token).cloned())
    }
}
