//! Deadswitch Vault
//!
//! A custodial dead man's switch: the owner deposits assets and must
//! periodically prove liveness. If a deadline passes without a heartbeat,
//! the beneficiary gains exclusive withdrawal rights.
//!
//! # Concepts
//!
//! - **Heartbeat**: owner-only call that moves `last_heartbeat` forward by
//!   exactly one `heartbeat_period`
//! - **Deadline**: `last_heartbeat + heartbeat_period`
//! - **ALIVE** (before the deadline): only the owner may withdraw
//! - **EXPIRED** (at/after the deadline): only the beneficiary may withdraw
//! - **Asset ledger**: external collaborator that actually moves funds
//!
//! # Example
//!
//! ```
//! use deadswitch_vault::{Address, AssetId, CallContext, MemoryLedger, Vault};
//!
//! let owner = Address::repeat(0x01);
//! let heir = Address::repeat(0x02);
//! let mut assets = MemoryLedger::new(Address::repeat(0xEE));
//! assets.mint(AssetId::Native, owner, 1_000).unwrap();
//!
//! let mut vault = Vault::new(owner, heir, 30 * 86_400, 0).unwrap();
//! vault.deposit_native(&CallContext::new(owner, 10), 1_000, &mut assets).unwrap();
//!
//! // Deadline passes without a heartbeat: the heir takes over
//! let late = CallContext::new(heir, 31 * 86_400);
//! vault.withdraw_native(&late, 1_000, &mut assets).unwrap();
//! assert_eq!(assets.balance(AssetId::Native, heir), 1_000);
//! ```

pub mod access;
pub mod asset;
pub mod events;
pub mod heartbeat;
pub mod ledger;
pub mod memory;
pub mod state;
pub mod timer;
pub mod vault;

#[cfg(test)]
mod test_utils;

pub use access::{authorize, Operation, Role, Roles};
pub use asset::{Address, Amount, AssetId, AssetLedger, ParseError, TransferError};
pub use events::VaultEvent;
pub use heartbeat::{evaluate_heartbeat, HeartbeatAction, HeartbeatConfig, HeartbeatStatus};
pub use ledger::VaultLedger;
pub use memory::MemoryLedger;
pub use state::{StateError, VaultStore};
pub use timer::{Clock, FixedClock, LivenessTimer, SystemClock, TimerState, Timestamp};
pub use vault::{CallContext, Vault, VaultError};
