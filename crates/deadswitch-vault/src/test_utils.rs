//! Shared test fixtures for deadswitch-vault tests.
//!
//! Deterministic identities, a pre-funded in-memory ledger and a ledger
//! wrapper that can be told to refuse payouts.

use crate::asset::{Address, Amount, AssetId, AssetLedger, TransferError};
use crate::memory::MemoryLedger;
use crate::vault::Vault;

pub const OWNER: Address = Address::repeat(0x01);
pub const BENEFICIARY: Address = Address::repeat(0x02);
pub const OUTSIDER: Address = Address::repeat(0x03);
pub const TOKEN: Address = Address::repeat(0x70);
pub const CUSTODIAN: Address = Address::repeat(0xEE);

/// Vault created at t=0 for OWNER/BENEFICIARY with the given period.
pub fn make_test_vault(heartbeat_period: u64) -> Vault {
    Vault::new(OWNER, BENEFICIARY, heartbeat_period, 0).unwrap()
}

/// Ledger where OWNER holds 10,000 native and 1,000 HST; the others hold 1,000 native.
pub fn funded_ledger() -> MemoryLedger {
    let mut ledger = MemoryLedger::new(CUSTODIAN);
    ledger.register_token(TOKEN, "HST");
    ledger.mint(AssetId::Native, OWNER, 10_000).unwrap();
    ledger.mint(AssetId::Native, BENEFICIARY, 1_000).unwrap();
    ledger.mint(AssetId::Native, OUTSIDER, 1_000).unwrap();
    ledger.mint(AssetId::Token(TOKEN), OWNER, 1_000).unwrap();
    ledger
}

/// Wraps a [`MemoryLedger`] and fails payouts on demand.
pub struct RefusingLedger {
    pub inner: MemoryLedger,
    pub refuse_payouts: bool,
}

impl RefusingLedger {
    pub fn new(inner: MemoryLedger) -> Self {
        Self {
            inner,
            refuse_payouts: false,
        }
    }
}

impl AssetLedger for RefusingLedger {
    fn transfer_in(
        &mut self,
        asset: AssetId,
        from: Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        self.inner.transfer_in(asset, from, amount)
    }

    fn transfer_out(
        &mut self,
        asset: AssetId,
        to: Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        if self.refuse_payouts {
            return Err(TransferError::Rejected(format!("payout to {} refused", to)));
        }
        self.inner.transfer_out(asset, to, amount)
    }

    fn symbol(&self, asset: AssetId) -> Option<String> {
        self.inner.symbol(asset)
    }
}
