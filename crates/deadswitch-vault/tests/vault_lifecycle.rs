//! End-to-end lifecycle of a dead man's switch vault.
//!
//! Drives a vault through funding, heartbeats, expiry and the
//! beneficiary's claim, checking the balance book against the asset
//! ledger after every step.

use deadswitch_vault::{
    Address, AssetId, CallContext, MemoryLedger, TimerState, Vault, VaultError, VaultEvent,
};

const OWNER: Address = Address::repeat(0x01);
const BENEFICIARY: Address = Address::repeat(0x02);
const STRANGER: Address = Address::repeat(0x03);
const TOKEN: Address = Address::repeat(0x70);
const CUSTODIAN: Address = Address::repeat(0xEE);

fn at(caller: Address, now: u64) -> CallContext {
    CallContext::new(caller, now)
}

fn funded_ledger() -> MemoryLedger {
    let mut ledger = MemoryLedger::new(CUSTODIAN);
    ledger.register_token(TOKEN, "HST");
    ledger.mint(AssetId::Native, OWNER, 1_000_000).unwrap();
    ledger.mint(AssetId::Native, BENEFICIARY, 1_000).unwrap();
    ledger.mint(AssetId::Token(TOKEN), OWNER, 1_000).unwrap();
    ledger
}

/// The vault may never record more than the ledger holds for it.
fn assert_backed(vault: &Vault, ledger: &MemoryLedger) {
    for (asset, recorded) in vault.ledger().balances() {
        assert!(
            recorded <= ledger.custody_balance(asset),
            "{} recorded {} but custody holds {}",
            asset,
            recorded,
            ledger.custody_balance(asset)
        );
    }
}

#[test]
fn test_heartbeat_schedule_scenario() {
    // period 1000s, created at t=0
    let mut vault = Vault::new(OWNER, BENEFICIARY, 1000, 0).unwrap();

    vault.heartbeat(&at(OWNER, 400)).unwrap();
    assert_eq!(vault.last_heartbeat(), 1000);

    let err = vault.heartbeat(&at(BENEFICIARY, 500)).unwrap_err();
    assert!(matches!(err, VaultError::Unauthorized { .. }));
    assert_eq!(vault.last_heartbeat(), 1000);
}

#[test]
fn test_heartbeat_count_determines_last_heartbeat() {
    let created_at = 1_700_000_000;
    let period = 86_400;
    let mut vault = Vault::new(OWNER, BENEFICIARY, period, created_at).unwrap();

    let mut successes = 0u64;
    let mut now = created_at;
    for step in 0..50u64 {
        now += 3_600 * (step % 7 + 1);
        let caller = match step % 3 {
            0 => OWNER,
            1 => BENEFICIARY,
            _ => STRANGER,
        };
        match vault.heartbeat(&at(caller, now)) {
            Ok(_) => {
                assert_eq!(caller, OWNER);
                successes += 1;
            }
            Err(e) => {
                assert_ne!(caller, OWNER);
                assert!(matches!(e, VaultError::Unauthorized { .. }));
            }
        }
        assert_eq!(vault.last_heartbeat(), created_at + period * successes);
    }
    assert_eq!(successes, 17);
}

#[test]
fn test_token_deposit_after_funds_moved_away() {
    let mut vault = Vault::new(OWNER, BENEFICIARY, 1000, 0).unwrap();
    let mut ledger = funded_ledger();
    let token = AssetId::Token(TOKEN);

    // Owner hands all tokens to a second holder who funds the vault
    ledger.transfer(token, OWNER, BENEFICIARY, 1_000).unwrap();
    let event = vault
        .deposit_token(&at(BENEFICIARY, 10), TOKEN, 1_000, &mut ledger)
        .unwrap();
    assert_eq!(
        event,
        VaultEvent::Deposited {
            asset: token,
            amount: 1_000,
            from: BENEFICIARY,
        }
    );
    assert_eq!(vault.balance_of(token), 1_000);
    assert_eq!(ledger.balance(token, BENEFICIARY), 0);
    assert_eq!(ledger.custody_balance(token), 1_000);

    // The now-empty holder cannot deposit again
    let err = vault
        .deposit_token(&at(BENEFICIARY, 20), TOKEN, 1_000, &mut ledger)
        .unwrap_err();
    assert!(matches!(err, VaultError::TransferFailed { .. }));
    assert_eq!(vault.balance_of(token), 1_000);
    assert_backed(&vault, &ledger);
}

#[test]
fn test_beneficiary_claims_after_deadline() {
    let mut vault = Vault::new(OWNER, BENEFICIARY, 1000, 0).unwrap();
    let mut ledger = funded_ledger();
    vault
        .deposit_native(&at(OWNER, 1), 5_000, &mut ledger)
        .unwrap();

    let now = 1_200;
    assert_eq!(vault.state(now), TimerState::Expired);

    let before = ledger.balance(AssetId::Native, BENEFICIARY);
    vault
        .withdraw_native(&at(BENEFICIARY, now), 3_000, &mut ledger)
        .unwrap();
    assert_eq!(vault.balance_of(AssetId::Native), 2_000);
    assert_eq!(ledger.balance(AssetId::Native, BENEFICIARY), before + 3_000);

    let err = vault
        .withdraw_native(&at(OWNER, now), 2_000, &mut ledger)
        .unwrap_err();
    assert!(matches!(err, VaultError::Unauthorized { .. }));
    assert_eq!(vault.balance_of(AssetId::Native), 2_000);
    assert_backed(&vault, &ledger);
}

#[test]
fn test_owner_heartbeat_after_expiry_returns_control() {
    let mut vault = Vault::new(OWNER, BENEFICIARY, 1000, 0).unwrap();
    let mut ledger = funded_ledger();
    vault
        .deposit_native(&at(OWNER, 1), 100, &mut ledger)
        .unwrap();

    // Expired at t=1500: beneficiary window
    assert_eq!(vault.state(1500), TimerState::Expired);

    // Owner calls in late; deadline moves to 2000
    vault.heartbeat(&at(OWNER, 1500)).unwrap();
    assert_eq!(vault.state(1500), TimerState::Alive);

    assert!(matches!(
        vault.withdraw_native(&at(BENEFICIARY, 1600), 100, &mut ledger),
        Err(VaultError::Unauthorized { .. })
    ));
    vault
        .withdraw_native(&at(OWNER, 1600), 100, &mut ledger)
        .unwrap();
    assert_eq!(vault.balance_of(AssetId::Native), 0);
}

#[test]
fn test_balance_book_tracks_net_flows() {
    let mut vault = Vault::new(OWNER, BENEFICIARY, 10_000, 0).unwrap();
    let mut ledger = funded_ledger();

    let mut expected: u64 = 0;
    for i in 1..=40u64 {
        let amount = i * 37 % 500;
        let ctx = at(OWNER, i);
        if i % 3 == 0 {
            let before = vault.balance_of(AssetId::Native);
            match vault.withdraw_native(&ctx, amount, &mut ledger) {
                Ok(_) => expected -= amount,
                Err(VaultError::InsufficientBalance { .. }) => {
                    assert!(amount > before);
                }
                Err(VaultError::InvalidAmount(0)) => assert_eq!(amount, 0),
                Err(e) => panic!("unexpected error: {}", e),
            }
        } else {
            match vault.deposit_native(&ctx, amount, &mut ledger) {
                Ok(_) => expected += amount,
                Err(VaultError::InvalidAmount(0)) => assert_eq!(amount, 0),
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(vault.balance_of(AssetId::Native), expected);
        assert_backed(&vault, &ledger);
    }
}

#[test]
fn test_windows_never_overlap() {
    let mut vault = Vault::new(OWNER, BENEFICIARY, 1000, 0).unwrap();
    let mut ledger = funded_ledger();
    vault
        .deposit_native(&at(OWNER, 1), 1_000, &mut ledger)
        .unwrap();

    for now in [0u64, 1, 500, 998, 999, 1000, 1001, 5000] {
        let mut probe = vault.clone();
        let mut probe_ledger = ledger.clone();
        let owner_ok = probe
            .withdraw_native(&at(OWNER, now), 1, &mut probe_ledger)
            .is_ok();

        let mut probe = vault.clone();
        let mut probe_ledger = ledger.clone();
        let heir_ok = probe
            .withdraw_native(&at(BENEFICIARY, now), 1, &mut probe_ledger)
            .is_ok();

        assert!(owner_ok ^ heir_ok, "exactly one withdrawer at t={}", now);
        assert_eq!(heir_ok, now >= 1000);
    }
}
