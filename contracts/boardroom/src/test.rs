#![cfg(test)]

use crate::errors::ContractError;
use crate::storage;
use crate::{BoardroomContract, BoardroomContractClient};
use soroban_sdk::testutils::{Address as _, Ledger, LedgerInfo};
use soroban_sdk::{token, Address, Env};

const EPOCH_START: u64 = 1000;
const EPOCH_DURATION: u64 = 21_600; // 6 hours
const WITHDRAW_LOCKUP: u64 = 6;
const REWARD_LOCKUP: u64 = 3;
const SCALE: i128 = 1_000_000_000_000_000_000;

fn set_time(env: &Env, timestamp: u64) {
    env.ledger().set(LedgerInfo {
        timestamp,
        protocol_version: 22,
        sequence_number: (timestamp / 5) as u32,
        network_id: [0u8; 32],
        base_reserve: 10,
        min_temp_entry_ttl: 100,
        min_persistent_entry_ttl: 100,
        max_entry_ttl: 10_000_000,
    });
}

/// Timestamp `offset` seconds into the given epoch.
fn at_epoch(epoch: u64, offset: u64) -> u64 {
    EPOCH_START + epoch * EPOCH_DURATION + offset
}

struct TestBoardroom {
    env: Env,
    operator: Address,
    boardroom_id: Address,
    stake_token: Address,
    reward_token: Address,
}

fn setup_env() -> TestBoardroom {
    let env = Env::default();
    env.mock_all_auths();
    set_time(&env, EPOCH_START);

    let operator = Address::generate(&env);
    let boardroom_id = env.register(BoardroomContract, ());

    let stake_admin = Address::generate(&env);
    let stake_token = env
        .register_stellar_asset_contract_v2(stake_admin)
        .address();
    let reward_admin = Address::generate(&env);
    let reward_token = env
        .register_stellar_asset_contract_v2(reward_admin)
        .address();

    let client = BoardroomContractClient::new(&env, &boardroom_id);
    client.initialize(
        &operator,
        &stake_token,
        &reward_token,
        &EPOCH_START,
        &EPOCH_DURATION,
        &WITHDRAW_LOCKUP,
        &REWARD_LOCKUP,
    );

    // Seigniorage is pulled from the operator on each allocation.
    token::StellarAssetClient::new(&env, &reward_token).mint(&operator, &1_000_000);

    TestBoardroom {
        env,
        operator,
        boardroom_id,
        stake_token,
        reward_token,
    }
}

fn new_member(t: &TestBoardroom, shares: i128) -> Address {
    let member = Address::generate(&t.env);
    token::StellarAssetClient::new(&t.env, &t.stake_token).mint(&member, &shares);
    member
}

fn balance(env: &Env, token_addr: &Address, who: &Address) -> i128 {
    token::Client::new(env, token_addr).balance(who)
}

// ========== Initialization ==========

#[test]
fn test_initialize() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    assert_eq!(client.total_staked(), 0);
    assert_eq!(client.current_epoch(), 0);
    // Genesis snapshot is written at initialize.
    assert_eq!(client.snapshot_count(), 1);
    let genesis = client.get_snapshot(&0);
    assert_eq!(genesis.reward_received, 0);
    assert_eq!(genesis.reward_per_share, 0);
}

#[test]
fn test_double_initialize_fails() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let result = client.try_initialize(
        &t.operator,
        &t.stake_token,
        &t.reward_token,
        &EPOCH_START,
        &EPOCH_DURATION,
        &WITHDRAW_LOCKUP,
        &REWARD_LOCKUP,
    );
    assert_eq!(result, Err(Ok(ContractError::AlreadyInitialized)));
}

#[test]
fn test_initialize_invalid_lockup_fails() {
    let env = Env::default();
    env.mock_all_auths();
    set_time(&env, EPOCH_START);
    let operator = Address::generate(&env);
    let some = Address::generate(&env);
    let id = env.register(BoardroomContract, ());
    let client = BoardroomContractClient::new(&env, &id);

    // reward lockup longer than withdraw lockup
    let result =
        client.try_initialize(&operator, &some, &some, &EPOCH_START, &EPOCH_DURATION, &3, &6);
    assert_eq!(result, Err(Ok(ContractError::InvalidLockup)));

    // zero epoch duration
    let result = client.try_initialize(&operator, &some, &some, &EPOCH_START, &0, &6, &3);
    assert_eq!(result, Err(Ok(ContractError::InvalidConfiguration)));
}

// ========== Epoch lockup gate ==========

#[test]
fn test_lockup_gate_scenario() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member_a = new_member(&t, 100);
    let member_b = new_member(&t, 100);

    // Stake at epoch 0.
    client.stake(&member_a, &100);
    client.stake(&member_b, &100);

    // Inject 10 reward units while still in epoch 0.
    set_time(&t.env, at_epoch(0, 10));
    client.allocate_seigniorage(&t.operator, &10);

    // Withdraw at epoch 2: still locked.
    set_time(&t.env, at_epoch(2, 0));
    let result = client.try_withdraw(&member_a, &50);
    assert_eq!(result, Err(Ok(ContractError::StillLocked)));

    // Claim at epoch 3: succeeds, pays A's half of the injection.
    set_time(&t.env, at_epoch(3, 0));
    assert_eq!(client.claim_reward(&member_a), 5);
    assert_eq!(balance(&t.env, &t.reward_token, &member_a), 5);

    // Withdraw at epoch 6: B (timer untouched since epoch 0) succeeds; the
    // internal claim pays B's reward along with the principal.
    set_time(&t.env, at_epoch(6, 0));
    client.withdraw(&member_b, &100);
    assert_eq!(balance(&t.env, &t.stake_token, &member_b), 100);
    assert_eq!(balance(&t.env, &t.reward_token, &member_b), 5);

    // A's claim at epoch 3 restarted A's timer: locked until epoch 9.
    let result = client.try_withdraw(&member_a, &50);
    assert_eq!(result, Err(Ok(ContractError::StillLocked)));
    set_time(&t.env, at_epoch(9, 0));
    client.withdraw(&member_a, &100);
    assert_eq!(balance(&t.env, &t.stake_token, &member_a), 100);
}

#[test]
fn test_restake_resets_both_lockups() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member = new_member(&t, 200);

    client.stake(&member, &100);

    // Top up at epoch 5: the timer restarts from 5.
    set_time(&t.env, at_epoch(5, 0));
    client.stake(&member, &100);

    set_time(&t.env, at_epoch(6, 0));
    let result = client.try_withdraw(&member, &200);
    assert_eq!(result, Err(Ok(ContractError::StillLocked)));

    set_time(&t.env, at_epoch(11, 0));
    client.withdraw(&member, &200);
    assert_eq!(balance(&t.env, &t.stake_token, &member), 200);
}

#[test]
fn test_claim_before_reward_lockup_fails() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member = new_member(&t, 100);
    client.stake(&member, &100);

    set_time(&t.env, at_epoch(0, 10));
    client.allocate_seigniorage(&t.operator, &10);

    set_time(&t.env, at_epoch(2, 0));
    let result = client.try_claim_reward(&member);
    assert_eq!(result, Err(Ok(ContractError::StillLocked)));
}

#[test]
fn test_claim_with_no_reward_is_noop() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member = new_member(&t, 100);
    client.stake(&member, &100);

    // Nothing allocated: the claim path has nothing to gate.
    set_time(&t.env, at_epoch(1, 0));
    assert_eq!(client.claim_reward(&member), 0);
}

#[test]
fn test_withdraw_zero_fails() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member = new_member(&t, 100);
    client.stake(&member, &100);

    set_time(&t.env, at_epoch(6, 0));
    let result = client.try_withdraw(&member, &0);
    assert_eq!(result, Err(Ok(ContractError::InvalidAmount)));
}

#[test]
fn test_withdraw_more_than_balance_fails() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member = new_member(&t, 100);
    client.stake(&member, &100);

    set_time(&t.env, at_epoch(6, 0));
    let result = client.try_withdraw(&member, &200);
    assert_eq!(result, Err(Ok(ContractError::InsufficientStake)));
}

#[test]
fn test_stake_zero_fails() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member = new_member(&t, 100);
    let result = client.try_stake(&member, &0);
    assert_eq!(result, Err(Ok(ContractError::InvalidAmount)));
}

#[test]
fn test_exit_pays_reward_and_principal() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member = new_member(&t, 100);
    client.stake(&member, &100);

    set_time(&t.env, at_epoch(0, 10));
    client.allocate_seigniorage(&t.operator, &10);

    set_time(&t.env, at_epoch(6, 0));
    client.exit(&member);
    assert_eq!(balance(&t.env, &t.stake_token, &member), 100);
    assert_eq!(balance(&t.env, &t.reward_token, &member), 10);
    assert_eq!(client.total_staked(), 0);
}

// ========== Seigniorage & snapshot history ==========

#[test]
fn test_allocate_with_zero_stake_fails() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let result = client.try_allocate_seigniorage(&t.operator, &10);
    assert_eq!(result, Err(Ok(ContractError::DivisionByZeroGuard)));
}

#[test]
fn test_allocate_zero_amount_fails() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let result = client.try_allocate_seigniorage(&t.operator, &0);
    assert_eq!(result, Err(Ok(ContractError::InvalidAmount)));
}

#[test]
fn test_allocate_non_operator_fails() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let rando = Address::generate(&t.env);
    let result = client.try_allocate_seigniorage(&rando, &10);
    assert_eq!(result, Err(Ok(ContractError::Unauthorized)));
}

#[test]
fn test_equal_stakers_split_regardless_of_claim_order() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member_a = new_member(&t, 100);
    let member_b = new_member(&t, 100);
    client.stake(&member_a, &100);
    client.stake(&member_b, &100);

    set_time(&t.env, at_epoch(0, 10));
    client.allocate_seigniorage(&t.operator, &10);

    assert_eq!(client.earned(&member_a), 5);
    assert_eq!(client.earned(&member_b), 5);

    set_time(&t.env, at_epoch(3, 0));
    assert_eq!(client.claim_reward(&member_b), 5);
    assert_eq!(client.claim_reward(&member_a), 5);
    assert_eq!(balance(&t.env, &t.reward_token, &member_a), 5);
    assert_eq!(balance(&t.env, &t.reward_token, &member_b), 5);
}

#[test]
fn test_snapshot_settlement_across_injections() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member_a = new_member(&t, 100);
    let member_b = new_member(&t, 100);

    client.stake(&member_a, &100);

    set_time(&t.env, at_epoch(0, 10));
    client.allocate_seigniorage(&t.operator, &10);

    set_time(&t.env, at_epoch(0, 20));
    client.stake(&member_b, &100);

    set_time(&t.env, at_epoch(0, 30));
    client.allocate_seigniorage(&t.operator, &10);

    // A was alone for the first tranche and shares the second.
    assert_eq!(client.earned(&member_a), 15);
    assert_eq!(client.earned(&member_b), 5);

    // History is append-only: genesis plus one entry per injection.
    assert_eq!(client.snapshot_count(), 3);
    let genesis = client.get_snapshot(&0);
    assert_eq!(genesis.reward_per_share, 0);
    let first = client.get_snapshot(&1);
    assert_eq!(first.reward_received, 10);
    assert_eq!(first.reward_per_share, 10 * SCALE / 100);
    let second = client.get_snapshot(&2);
    assert_eq!(second.reward_received, 10);
    assert_eq!(second.reward_per_share, 10 * SCALE / 100 + 10 * SCALE / 200);

    // The boardroom custodies both tranches.
    assert_eq!(balance(&t.env, &t.reward_token, &t.boardroom_id), 20);
}

// ========== Lockup admin ==========

#[test]
fn test_set_lockup_validation() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);

    let result = client.try_set_lockup(&t.operator, &6, &0);
    assert_eq!(result, Err(Ok(ContractError::InvalidLockup)));
    let result = client.try_set_lockup(&t.operator, &5, &6);
    assert_eq!(result, Err(Ok(ContractError::InvalidLockup)));
    let result = client.try_set_lockup(&t.operator, &57, &3);
    assert_eq!(result, Err(Ok(ContractError::InvalidLockup)));

    let rando = Address::generate(&t.env);
    let result = client.try_set_lockup(&rando, &6, &3);
    assert_eq!(result, Err(Ok(ContractError::Unauthorized)));
}

#[test]
fn test_set_lockup_takes_effect() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member = new_member(&t, 100);
    client.stake(&member, &100);

    client.set_lockup(&t.operator, &2, &1);

    set_time(&t.env, at_epoch(2, 0));
    client.withdraw(&member, &100);
    assert_eq!(balance(&t.env, &t.stake_token, &member), 100);
}

// ========== Same-ledger throttle ==========

#[test]
fn test_same_ledger_second_action_rejected() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member = new_member(&t, 200);

    client.stake(&member, &100);
    let result = client.try_stake(&member, &100);
    assert_eq!(result, Err(Ok(ContractError::SameLedgerReentry)));

    // A later ledger accepts the same member again.
    set_time(&t.env, at_epoch(0, 10));
    client.stake(&member, &100);
    assert_eq!(client.balance_of(&member), 200);
}

// ========== Reentrancy guard ==========

#[test]
fn test_guard_rejects_nested_acquire() {
    let t = setup_env();
    t.env.as_contract(&t.boardroom_id, || {
        assert_eq!(storage::acquire_guard(&t.env), Ok(()));
        assert_eq!(
            storage::acquire_guard(&t.env),
            Err(ContractError::ReentrantCall)
        );
        storage::release_guard(&t.env);
        assert_eq!(storage::acquire_guard(&t.env), Ok(()));
    });
}

#[test]
fn test_entry_points_rejected_while_guard_held() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let member = new_member(&t, 100);

    // Simulate a call arriving while another mutating entry point is live.
    t.env
        .as_contract(&t.boardroom_id, || storage::acquire_guard(&t.env))
        .unwrap();
    let result = client.try_stake(&member, &100);
    assert_eq!(result, Err(Ok(ContractError::ReentrantCall)));
    let result = client.try_set_lockup(&t.operator, &6, &3);
    assert_eq!(result, Err(Ok(ContractError::ReentrantCall)));

    t.env
        .as_contract(&t.boardroom_id, || storage::release_guard(&t.env));
    client.stake(&member, &100);
    assert_eq!(client.balance_of(&member), 100);
}

// ========== Fund recovery ==========

#[test]
fn test_recover_protected_tokens_rejected() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let to = Address::generate(&t.env);

    let result = client.try_recover_unsupported(&t.operator, &t.stake_token, &1, &to);
    assert_eq!(result, Err(Ok(ContractError::ProtectedAssetWithdrawal)));
    let result = client.try_recover_unsupported(&t.operator, &t.reward_token, &1, &to);
    assert_eq!(result, Err(Ok(ContractError::ProtectedAssetWithdrawal)));
}

#[test]
fn test_recover_stray_token() {
    let t = setup_env();
    let client = BoardroomContractClient::new(&t.env, &t.boardroom_id);
    let stray_admin = Address::generate(&t.env);
    let stray = t
        .env
        .register_stellar_asset_contract_v2(stray_admin)
        .address();
    token::StellarAssetClient::new(&t.env, &stray).mint(&t.boardroom_id, &42);

    let to = Address::generate(&t.env);
    client.recover_unsupported(&t.operator, &stray, &42, &to);
    assert_eq!(balance(&t.env, &stray, &to), 42);
}
