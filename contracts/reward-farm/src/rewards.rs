use soroban_sdk::Env;

use crate::emission;
use crate::errors::ContractError;
use crate::storage::{self, FarmConfig, Pool, UserPosition};

/// Precision multiplier for accumulated reward per share (1e18).
pub const SCALE: i128 = 1_000_000_000_000_000_000;

/// Lazily settle a pool's accumulator up to the current time. Idempotent:
/// calling it again with no elapsed time leaves the state unchanged.
/// Returns the settled Pool.
///
/// A pool with zero stake only advances its clock; the reward for that
/// window is not banked. The one-way `started` transition (which adds the
/// pool's weight to the global total) happens on the first settlement that
/// sees a non-zero stake.
pub fn update_pool(
    env: &Env,
    config: &FarmConfig,
    pool_index: u32,
) -> Result<Pool, ContractError> {
    let mut pool = storage::get_pool(env, pool_index)?;
    let now = env.ledger().timestamp();

    if now <= pool.last_settled_time {
        return Ok(pool);
    }

    if pool.total_staked == 0 {
        pool.last_settled_time = now;
        storage::set_pool(env, pool_index, &pool);
        return Ok(pool);
    }

    if !pool.started {
        pool.started = true;
        let total = storage::get_total_alloc_points(env)
            .checked_add(pool.alloc_points)
            .ok_or(ContractError::ArithmeticOverflow)?;
        storage::set_total_alloc_points(env, total);
    }

    if config.pin_rates_on_settle {
        emission::pin_default_rate(env, config, pool.last_settled_time, now);
    }

    let generated = emission::generated_reward(env, config, pool.last_settled_time, now)?;
    let total_alloc = storage::get_total_alloc_points(env);
    if total_alloc == 0 {
        // Unreachable after the started transition above, checked anyway.
        return Err(ContractError::DivisionByZeroGuard);
    }

    let pool_share = generated
        .checked_mul(pool.alloc_points as i128)
        .ok_or(ContractError::ArithmeticOverflow)?
        / total_alloc as i128;
    let per_share = pool_share
        .checked_mul(SCALE)
        .ok_or(ContractError::ArithmeticOverflow)?
        / pool.total_staked;
    pool.acc_reward_per_share = pool
        .acc_reward_per_share
        .checked_add(per_share)
        .ok_or(ContractError::ArithmeticOverflow)?;
    pool.last_settled_time = now;

    storage::set_pool(env, pool_index, &pool);
    Ok(pool)
}

/// Pending reward for a position against a settled pool. Caller must have
/// run update_pool first.
///
/// The accumulator is monotone and the debt is recomputed after every
/// settlement, so the result can never go negative; a negative value means
/// corrupted state and fails the whole operation.
pub fn calculate_pending(pool: &Pool, position: &UserPosition) -> Result<i128, ContractError> {
    if position.staked_amount == 0 {
        return Ok(0);
    }
    let accumulated = position
        .staked_amount
        .checked_mul(pool.acc_reward_per_share)
        .ok_or(ContractError::ArithmeticOverflow)?
        / SCALE;
    let pending = accumulated - position.reward_debt;
    if pending < 0 {
        return Err(ContractError::NegativePending);
    }
    Ok(pending)
}

/// View-only: simulate the accumulated reward per share at the current time
/// without writing to storage. Used for pending_reward queries.
pub fn simulate_acc_reward(
    env: &Env,
    config: &FarmConfig,
    pool: &Pool,
) -> Result<i128, ContractError> {
    let now = env.ledger().timestamp();
    if now <= pool.last_settled_time || pool.total_staked == 0 {
        return Ok(pool.acc_reward_per_share);
    }

    // A never-started pool with stake joins the weight sum at settlement;
    // mirror that here so the view matches the next real settle.
    let mut total_alloc = storage::get_total_alloc_points(env);
    if !pool.started {
        total_alloc = total_alloc
            .checked_add(pool.alloc_points)
            .ok_or(ContractError::ArithmeticOverflow)?;
    }
    if total_alloc == 0 {
        return Err(ContractError::DivisionByZeroGuard);
    }

    let generated = emission::generated_reward(env, config, pool.last_settled_time, now)?;
    let pool_share = generated
        .checked_mul(pool.alloc_points as i128)
        .ok_or(ContractError::ArithmeticOverflow)?
        / total_alloc as i128;
    let per_share = pool_share
        .checked_mul(SCALE)
        .ok_or(ContractError::ArithmeticOverflow)?
        / pool.total_staked;
    pool.acc_reward_per_share
        .checked_add(per_share)
        .ok_or(ContractError::ArithmeticOverflow)
}

/// Compute the reward_debt for a position given its staked amount and the
/// current accumulator.
pub fn compute_reward_debt(
    staked_amount: i128,
    acc_reward_per_share: i128,
) -> Result<i128, ContractError> {
    Ok(staked_amount
        .checked_mul(acc_reward_per_share)
        .ok_or(ContractError::ArithmeticOverflow)?
        / SCALE)
}
