use soroban_sdk::{contracttype, Address, Env};

use crate::errors::ContractError;

// Storage TTL constants (in ledgers, ~5 seconds each)
const INSTANCE_TTL_THRESHOLD: u32 = 17_280; // ~1 day
const INSTANCE_TTL_EXTEND: u32 = 518_400; // ~30 days
const PERSISTENT_TTL_THRESHOLD: u32 = 17_280; // ~1 day
const PERSISTENT_TTL_EXTEND: u32 = 518_400; // ~30 days

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,
    TotalStaked,
    Balance(Address),
    Seat(Address),
    SnapshotCount,
    Snapshot(u64),
    LastActionLedger(Address),
    ReentrancyGuard,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoardroomConfig {
    pub operator: Address,
    pub stake_token: Address,
    pub reward_token: Address,
    pub epoch_start: u64,
    pub epoch_duration: u64,
    pub withdraw_lockup_epochs: u64,
    pub reward_lockup_epochs: u64,
}

/// One entry of the append-only reward-injection history. Never mutated or
/// truncated; members settle against the delta between two indices.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardSnapshot {
    pub epoch: u64,
    pub reward_received: i128,
    pub reward_per_share: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemberSeat {
    pub last_snapshot_index: u64,
    pub reward_earned: i128,
    pub epoch_timer_start: u64,
}

// --- Instance storage helpers ---

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_config(env: &Env) -> Result<BoardroomConfig, ContractError> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(ContractError::NotInitialized)
}

pub fn set_config(env: &Env, config: &BoardroomConfig) {
    env.storage().instance().set(&DataKey::Config, config);
}

pub fn get_total_staked(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalStaked)
        .unwrap_or(0)
}

pub fn set_total_staked(env: &Env, total: i128) {
    env.storage().instance().set(&DataKey::TotalStaked, &total);
}

pub fn get_snapshot_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::SnapshotCount)
        .unwrap_or(0)
}

pub fn set_snapshot_count(env: &Env, count: u64) {
    env.storage().instance().set(&DataKey::SnapshotCount, &count);
}

pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

// --- Reentrancy guard ---

pub fn acquire_guard(env: &Env) -> Result<(), ContractError> {
    if env
        .storage()
        .instance()
        .get(&DataKey::ReentrancyGuard)
        .unwrap_or(false)
    {
        return Err(ContractError::ReentrantCall);
    }
    env.storage().instance().set(&DataKey::ReentrancyGuard, &true);
    Ok(())
}

pub fn release_guard(env: &Env) {
    env.storage()
        .instance()
        .set(&DataKey::ReentrancyGuard, &false);
}

// --- Same-ledger throttle (one mutating call per ledger per account) ---

pub fn check_and_mark_ledger(env: &Env, account: &Address) -> Result<(), ContractError> {
    let key = DataKey::LastActionLedger(account.clone());
    let sequence = env.ledger().sequence();
    let last: Option<u32> = env.storage().temporary().get(&key);
    if last == Some(sequence) {
        return Err(ContractError::SameLedgerReentry);
    }
    env.storage().temporary().set(&key, &sequence);
    Ok(())
}

// --- Persistent storage helpers (Balance, Seat, Snapshot) ---

pub fn get_balance(env: &Env, member: &Address) -> i128 {
    let key = DataKey::Balance(member.clone());
    let balance: i128 = env.storage().persistent().get(&key).unwrap_or(0);
    balance
}

pub fn set_balance(env: &Env, member: &Address, balance: i128) {
    let key = DataKey::Balance(member.clone());
    env.storage().persistent().set(&key, &balance);
    extend_persistent(env, &key);
}

pub fn get_seat(env: &Env, member: &Address) -> MemberSeat {
    let key = DataKey::Seat(member.clone());
    let seat: MemberSeat = env.storage().persistent().get(&key).unwrap_or(MemberSeat {
        last_snapshot_index: 0,
        reward_earned: 0,
        epoch_timer_start: 0,
    });
    seat
}

pub fn set_seat(env: &Env, member: &Address, seat: &MemberSeat) {
    let key = DataKey::Seat(member.clone());
    env.storage().persistent().set(&key, seat);
    extend_persistent(env, &key);
}

pub fn get_snapshot(env: &Env, index: u64) -> Result<RewardSnapshot, ContractError> {
    let key = DataKey::Snapshot(index);
    env.storage()
        .persistent()
        .get(&key)
        .ok_or(ContractError::NotInitialized)
}

/// Append-only: snapshots are written once at the next free index.
pub fn push_snapshot(env: &Env, snapshot: &RewardSnapshot) -> u64 {
    let index = get_snapshot_count(env);
    let key = DataKey::Snapshot(index);
    env.storage().persistent().set(&key, snapshot);
    extend_persistent(env, &key);
    set_snapshot_count(env, index + 1);
    index
}

fn extend_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}
