//! The vault: access control, liveness timer and balance book composed
//! behind the public operations.
//!
//! Every operation follows the same order:
//!
//! 1. access check (caller role × timer window)
//! 2. validate and update the vault's own state
//! 3. call the [`AssetLedger`] for the actual transfer
//! 4. return the [`VaultEvent`]
//!
//! A withdrawal debits the balance book *before* paying out, so a reentrant
//! call made from inside the transfer would see the reduced balance. If the
//! payout fails the debit is restored before returning, and the caller sees
//! an unchanged vault.

use crate::access::{Operation, Roles};
use crate::asset::{Address, Amount, AssetId, AssetLedger, TransferError};
use crate::events::VaultEvent;
use crate::ledger::VaultLedger;
use crate::timer::{Clock, LivenessTimer, TimerState, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from vault operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("Unauthorized: {caller} may not {operation} while the vault is {state}")]
    Unauthorized {
        caller: Address,
        operation: Operation,
        state: TimerState,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Amount),

    #[error("Insufficient balance of {asset}: available {available}, requested {requested}")]
    InsufficientBalance {
        asset: AssetId,
        available: Amount,
        requested: Amount,
    },

    #[error("Transfer of {asset} failed: {source}")]
    TransferFailed {
        asset: AssetId,
        source: TransferError,
    },

    #[error("Heartbeat period must be positive")]
    InvalidHeartbeatPeriod,

    #[error("Owner and beneficiary must be different identities")]
    RoleConflict,

    #[error("Heartbeat deadline does not fit in the timestamp range")]
    DeadlineOverflow,
}

/// Who is calling and when, as supplied by the host for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self { caller, now }
    }

    /// Stamp a call from `caller` with the clock's current time.
    pub fn at(caller: Address, clock: &impl Clock) -> Self {
        Self::new(caller, clock.now())
    }
}

/// A single dead man's switch vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    roles: Roles,
    timer: LivenessTimer,
    ledger: VaultLedger,
}

impl Vault {
    /// Create a vault. `created_at` becomes the first `last_heartbeat`.
    pub fn new(
        owner: Address,
        beneficiary: Address,
        heartbeat_period: u64,
        created_at: Timestamp,
    ) -> Result<Self, VaultError> {
        Ok(Self {
            roles: Roles::new(owner, beneficiary)?,
            timer: LivenessTimer::new(created_at, heartbeat_period)?,
            ledger: VaultLedger::new(),
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn owner(&self) -> Address {
        self.roles.owner()
    }

    pub fn beneficiary(&self) -> Address {
        self.roles.beneficiary()
    }

    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    pub fn timer(&self) -> &LivenessTimer {
        &self.timer
    }

    pub fn last_heartbeat(&self) -> Timestamp {
        self.timer.last_heartbeat()
    }

    pub fn heartbeat_period(&self) -> u64 {
        self.timer.heartbeat_period()
    }

    pub fn deadline(&self) -> Timestamp {
        self.timer.deadline()
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.timer.is_expired(now)
    }

    pub fn state(&self, now: Timestamp) -> TimerState {
        self.timer.state(now)
    }

    pub fn balance_of(&self, asset: AssetId) -> Amount {
        self.ledger.balance_of(asset)
    }

    pub fn ledger(&self) -> &VaultLedger {
        &self.ledger
    }

    // ------------------------------------------------------------------
    // Liveness
    // ------------------------------------------------------------------

    /// Owner proves liveness: `last_heartbeat` advances by exactly one period.
    ///
    /// Accepted after the deadline too, which hands withdrawal control back
    /// to the owner once the new deadline lies in the future.
    pub fn heartbeat(&mut self, ctx: &CallContext) -> Result<VaultEvent, VaultError> {
        let state = self.timer.state(ctx.now);
        self.authorize(ctx, state, Operation::Heartbeat)?;

        let last_heartbeat = self.timer.extend()?;
        let deadline = self.timer.deadline();
        if state == TimerState::Expired {
            log::info!(
                "Heartbeat after deadline; vault is {} at {}",
                self.timer.state(ctx.now),
                ctx.now
            );
        }
        log::info!("Heartbeat recorded: last={} deadline={}", last_heartbeat, deadline);

        Ok(VaultEvent::HeartbeatRecorded {
            last_heartbeat,
            deadline,
        })
    }

    // ------------------------------------------------------------------
    // Deposits
    // ------------------------------------------------------------------

    /// Deposit native currency sent by the caller.
    pub fn deposit_native<L>(
        &mut self,
        ctx: &CallContext,
        amount: Amount,
        assets: &mut L,
    ) -> Result<VaultEvent, VaultError>
    where
        L: AssetLedger + ?Sized,
    {
        self.deposit(ctx, AssetId::Native, amount, assets)
    }

    /// Pull `amount` of `token` from the caller into the vault.
    pub fn deposit_token<L>(
        &mut self,
        ctx: &CallContext,
        token: Address,
        amount: Amount,
        assets: &mut L,
    ) -> Result<VaultEvent, VaultError>
    where
        L: AssetLedger + ?Sized,
    {
        self.deposit(ctx, AssetId::Token(token), amount, assets)
    }

    fn deposit<L>(
        &mut self,
        ctx: &CallContext,
        asset: AssetId,
        amount: Amount,
        assets: &mut L,
    ) -> Result<VaultEvent, VaultError>
    where
        L: AssetLedger + ?Sized,
    {
        let state = self.timer.state(ctx.now);
        self.authorize(ctx, state, Operation::Deposit)?;

        // Validate the credit up front so nothing can fail after the funds move
        let credited = self.ledger.checked_credit(asset, amount)?;

        assets
            .transfer_in(asset, ctx.caller, amount)
            .map_err(|source| {
                log::warn!(
                    "Deposit of {} {} from {} failed: {}",
                    amount,
                    asset,
                    ctx.caller,
                    source
                );
                VaultError::TransferFailed { asset, source }
            })?;
        self.ledger.set(asset, credited);

        log::info!("Deposited {} {} from {}", amount, asset, ctx.caller);
        Ok(VaultEvent::Deposited {
            asset,
            amount,
            from: ctx.caller,
        })
    }

    // ------------------------------------------------------------------
    // Withdrawals
    // ------------------------------------------------------------------

    /// Withdraw native currency to the caller.
    pub fn withdraw_native<L>(
        &mut self,
        ctx: &CallContext,
        amount: Amount,
        assets: &mut L,
    ) -> Result<VaultEvent, VaultError>
    where
        L: AssetLedger + ?Sized,
    {
        self.withdraw(ctx, AssetId::Native, amount, assets)
    }

    /// Withdraw `amount` of `token` to the caller.
    pub fn withdraw_token<L>(
        &mut self,
        ctx: &CallContext,
        token: Address,
        amount: Amount,
        assets: &mut L,
    ) -> Result<VaultEvent, VaultError>
    where
        L: AssetLedger + ?Sized,
    {
        self.withdraw(ctx, AssetId::Token(token), amount, assets)
    }

    fn withdraw<L>(
        &mut self,
        ctx: &CallContext,
        asset: AssetId,
        amount: Amount,
        assets: &mut L,
    ) -> Result<VaultEvent, VaultError>
    where
        L: AssetLedger + ?Sized,
    {
        let state = self.timer.state(ctx.now);
        self.authorize(ctx, state, Operation::Withdraw)?;

        let remaining = self.ledger.checked_debit(asset, amount)?;
        let previous = self.ledger.set(asset, remaining);

        if let Err(source) = assets.transfer_out(asset, ctx.caller, amount) {
            self.ledger.set(asset, previous);
            log::warn!(
                "Withdrawal of {} {} to {} failed: {}",
                amount,
                asset,
                ctx.caller,
                source
            );
            return Err(VaultError::TransferFailed { asset, source });
        }

        log::info!("Withdrew {} {} to {} ({})", amount, asset, ctx.caller, state);
        Ok(VaultEvent::Withdrawn {
            asset,
            amount,
            to: ctx.caller,
            symbol: assets.symbol(asset),
        })
    }

    fn authorize(
        &self,
        ctx: &CallContext,
        state: TimerState,
        operation: Operation,
    ) -> Result<(), VaultError> {
        self.roles
            .check(ctx.caller, state, operation)
            .map(|_| ())
            .inspect_err(|e| log::warn!("{}", e))
    }
}
