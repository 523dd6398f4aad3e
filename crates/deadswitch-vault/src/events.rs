//! Events emitted by successful vault operations

use crate::asset::{Address, Amount, AssetId};
use crate::timer::Timestamp;
use serde::{Deserialize, Serialize};

/// Observable outcome of one successful operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum VaultEvent {
    /// The owner proved liveness
    HeartbeatRecorded {
        /// New `last_heartbeat`
        last_heartbeat: Timestamp,
        /// Deadline that now applies
        deadline: Timestamp,
    },

    /// Assets entered the vault
    Deposited {
        asset: AssetId,
        amount: Amount,
        /// Who funded the deposit
        from: Address,
    },

    /// Assets left the vault
    Withdrawn {
        asset: AssetId,
        amount: Amount,
        /// Recipient (always the caller)
        to: Address,
        /// Token ticker, when the asset ledger knows it
        symbol: Option<String>,
    },
}

impl VaultEvent {
    /// The asset involved, if any
    pub fn asset(&self) -> Option<AssetId> {
        match self {
            VaultEvent::HeartbeatRecorded { .. } => None,
            VaultEvent::Deposited { asset, .. } => Some(*asset),
            VaultEvent::Withdrawn { asset, .. } => Some(*asset),
        }
    }

    /// The amount moved, if any
    pub fn amount(&self) -> Option<Amount> {
        match self {
            VaultEvent::HeartbeatRecorded { .. } => None,
            VaultEvent::Deposited { amount, .. } => Some(*amount),
            VaultEvent::Withdrawn { amount, .. } => Some(*amount),
        }
    }
}
