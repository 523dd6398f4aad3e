//! Identities, asset identifiers and the asset ledger collaborator.
//!
//! The vault never moves funds itself. Every transfer goes through an
//! [`AssetLedger`], which must be atomic: a transfer either completes or
//! leaves every balance it touches unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Amount of an asset in its smallest unit.
pub type Amount = u64;

/// Errors from parsing identities and asset identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid hex: {0}")]
    Hex(String),

    #[error("Address must be 20 bytes, got {0}")]
    Length(usize),
}

/// Errors reported by an [`AssetLedger`] when it cannot move funds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("{holder} holds {available} of {asset}, cannot move {requested}")]
    InsufficientFunds {
        asset: AssetId,
        holder: Address,
        available: Amount,
        requested: Amount,
    },

    #[error("Balance of {holder} in {asset} would overflow")]
    Overflow { asset: AssetId, holder: Address },

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// A 20-byte account identity (owner, beneficiary, token contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Build an address whose every byte is `byte`. Handy for fixtures.
    pub const fn repeat(byte: u8) -> Self {
        Self([byte; 20])
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| ParseError::Hex(e.to_string()))?;
        let array: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseError::Length(bytes.len()))?;
        Ok(Self(array))
    }
}

/// Identifies one tracked asset: native currency or a fungible token contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetId {
    /// The host chain's native currency
    Native,
    /// A fungible token, identified by its contract address
    Token(Address),
}

impl AssetId {
    /// Text form of the native sentinel.
    pub const NATIVE: &'static str = "native";

    pub fn is_native(&self) -> bool {
        matches!(self, AssetId::Native)
    }

    /// The token contract address, if this is a token.
    pub fn token_address(&self) -> Option<Address> {
        match self {
            AssetId::Native => None,
            AssetId::Token(address) => Some(*address),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Native => f.write_str(Self::NATIVE),
            AssetId::Token(address) => address.fmt(f),
        }
    }
}

impl FromStr for AssetId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(Self::NATIVE) {
            Ok(AssetId::Native)
        } else {
            Ok(AssetId::Token(s.parse()?))
        }
    }
}

/// Serialize through the `Display`/`FromStr` text form so values can be JSON map keys.
macro_rules! string_serde {
    ($type:ty) => {
        impl Serialize for $type {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $type {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                <$type>::from_str(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(Address);
string_serde!(AssetId);

/// External ledger that actually holds the vault's assets.
///
/// Both transfer primitives must be all-or-nothing: on `Err` no balance
/// anywhere may have changed.
pub trait AssetLedger {
    /// Pull `amount` of `asset` from `from` into the vault's custody.
    fn transfer_in(&mut self, asset: AssetId, from: Address, amount: Amount)
        -> Result<(), TransferError>;

    /// Pay `amount` of `asset` out of the vault's custody to `to`.
    fn transfer_out(&mut self, asset: AssetId, to: Address, amount: Amount)
        -> Result<(), TransferError>;

    /// Ticker symbol of a token, when the ledger knows one.
    fn symbol(&self, _asset: AssetId) -> Option<String> {
        None
    }
}
