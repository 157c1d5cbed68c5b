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
    TotalAllocPoints,
    PoolCount,
    Pool(u32),
    StakeTokenIndex(Address),
    Position(Address, u32),
    WeekOverride(u64),
    ReentrancyGuard,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FarmConfig {
    pub operator: Address,
    pub reward_token: Address,
    pub dev_fund: Address,
    pub fee_collector: Address,
    pub start_time: u64,
    pub end_time: u64,
    pub default_rate_per_sec: i128,
    // Opt-in: freeze the default rate into the override table at each
    // settlement instead of pricing un-overridden history at the current
    // default.
    pub pin_rates_on_settle: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pool {
    pub stake_token: Address,
    pub alloc_points: u32,
    pub deposit_fee_bps: u32,
    pub withdraw_fee_bps: u32,
    pub allow_zero_withdraw: bool,
    pub started: bool,
    pub last_settled_time: u64,
    pub acc_reward_per_share: i128,
    pub total_staked: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserPosition {
    pub staked_amount: i128,
    pub reward_debt: i128,
}

// --- Instance storage helpers (Config, TotalAllocPoints, PoolCount) ---

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_config(env: &Env) -> Result<FarmConfig, ContractError> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(ContractError::NotInitialized)
}

pub fn set_config(env: &Env, config: &FarmConfig) {
    env.storage().instance().set(&DataKey::Config, config);
}

pub fn get_total_alloc_points(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::TotalAllocPoints)
        .unwrap_or(0)
}

pub fn set_total_alloc_points(env: &Env, total: u32) {
    env.storage()
        .instance()
        .set(&DataKey::TotalAllocPoints, &total);
}

pub fn get_pool_count(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::PoolCount)
        .unwrap_or(0)
}

pub fn set_pool_count(env: &Env, count: u32) {
    env.storage().instance().set(&DataKey::PoolCount, &count);
}

pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

// --- Reentrancy guard (instance, set while a mutating entry point runs) ---

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

// --- Persistent storage helpers (Pool, Position, WeekOverride) ---

pub fn get_pool(env: &Env, index: u32) -> Result<Pool, ContractError> {
    let key = DataKey::Pool(index);
    let pool: Pool = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(ContractError::PoolNotFound)?;
    extend_persistent(env, &key);
    Ok(pool)
}

pub fn set_pool(env: &Env, index: u32, pool: &Pool) {
    let key = DataKey::Pool(index);
    env.storage().persistent().set(&key, pool);
    extend_persistent(env, &key);
}

pub fn has_stake_token_index(env: &Env, stake_token: &Address) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::StakeTokenIndex(stake_token.clone()))
}

pub fn set_stake_token_index(env: &Env, stake_token: &Address, index: u32) {
    let key = DataKey::StakeTokenIndex(stake_token.clone());
    env.storage().persistent().set(&key, &index);
    extend_persistent(env, &key);
}

pub fn get_position(env: &Env, user: &Address, pool_index: u32) -> UserPosition {
    let key = DataKey::Position(user.clone(), pool_index);
    match env.storage().persistent().get(&key) {
        Some(position) => {
            extend_persistent(env, &key);
            position
        }
        None => UserPosition {
            staked_amount: 0,
            reward_debt: 0,
        },
    }
}

pub fn set_position(env: &Env, user: &Address, pool_index: u32, position: &UserPosition) {
    let key = DataKey::Position(user.clone(), pool_index);
    env.storage().persistent().set(&key, position);
    extend_persistent(env, &key);
}

pub fn get_week_override(env: &Env, week_index: u64) -> Option<i128> {
    let key = DataKey::WeekOverride(week_index);
    let rate: Option<i128> = env.storage().persistent().get(&key);
    if rate.is_some() {
        extend_persistent(env, &key);
    }
    rate
}

pub fn set_week_override(env: &Env, week_index: u64, rate: i128) {
    let key = DataKey::WeekOverride(week_index);
    env.storage().persistent().set(&key, &rate);
    extend_persistent(env, &key);
}

fn extend_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}
