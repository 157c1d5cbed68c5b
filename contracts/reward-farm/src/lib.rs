#![no_std]

mod emission;
mod errors;
mod events;
mod rewards;
mod storage;


use errors::ContractError;
use events::{
    DepositEvent, EmissionRateChangedEvent, RewardPaidEvent, RewardShortfallEvent, WithdrawEvent,
};
use soroban_sdk::{contract, contractimpl, symbol_short, token, Address, Env};
use storage::{FarmConfig, Pool, UserPosition};

/// Maximum deposit fee: 1%.
const MAX_DEPOSIT_FEE_BPS: u32 = 100;
/// Maximum withdraw fee: 2%.
const MAX_WITHDRAW_FEE_BPS: u32 = 200;
const BPS_DENOMINATOR: i128 = 10_000;

/// Reward and stake tokens stay unsweepable until this long after the
/// emission window closes.
const RECOVERY_PROTECTION_WINDOW: u64 = 90 * 24 * 60 * 60;

#[contract]
pub struct RewardFarmContract;

#[contractimpl]
impl RewardFarmContract {
    // ========== Admin Functions ==========

    /// One-time initialization.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        env: Env,
        operator: Address,
        reward_token: Address,
        dev_fund: Address,
        fee_collector: Address,
        default_rate_per_sec: i128,
        start_time: u64,
        end_time: u64,
        pin_rates_on_settle: bool,
    ) -> Result<(), ContractError> {
        if storage::has_config(&env) {
            return Err(ContractError::AlreadyInitialized);
        }
        if start_time >= end_time || default_rate_per_sec < 0 {
            return Err(ContractError::InvalidConfiguration);
        }

        operator.require_auth();

        storage::set_config(
            &env,
            &FarmConfig {
                operator,
                reward_token,
                dev_fund,
                fee_collector,
                start_time,
                end_time,
                default_rate_per_sec,
                pin_rates_on_settle,
            },
        );
        storage::set_pool_count(&env, 0);
        storage::set_total_alloc_points(&env, 0);
        storage::extend_instance_ttl(&env);

        Ok(())
    }

    /// Register a new stakeable asset. Pools are never deleted.
    pub fn add_pool(
        env: Env,
        operator: Address,
        stake_token: Address,
        alloc_points: u32,
        deposit_fee_bps: u32,
        withdraw_fee_bps: u32,
        allow_zero_withdraw: bool,
    ) -> Result<u32, ContractError> {
        let config = Self::require_operator(&env, &operator)?;
        storage::acquire_guard(&env)?;
        storage::extend_instance_ttl(&env);

        if storage::has_stake_token_index(&env, &stake_token) {
            return Err(ContractError::DuplicatePool);
        }
        if deposit_fee_bps > MAX_DEPOSIT_FEE_BPS || withdraw_fee_bps > MAX_WITHDRAW_FEE_BPS {
            return Err(ContractError::InvalidFee);
        }

        // Settle everyone at the old weight sum before the new pool joins it.
        Self::mass_update_pools(&env, &config)?;

        let index = storage::get_pool_count(&env);
        let now = env.ledger().timestamp();
        // A pool added once emission is running joins the weight sum right
        // away; one added before the window opens joins lazily at its first
        // settlement with stake.
        let started = now >= config.start_time;
        if started {
            let total = storage::get_total_alloc_points(&env)
                .checked_add(alloc_points)
                .ok_or(ContractError::ArithmeticOverflow)?;
            storage::set_total_alloc_points(&env, total);
        }
        storage::set_stake_token_index(&env, &stake_token, index);
        storage::set_pool(
            &env,
            index,
            &Pool {
                stake_token,
                alloc_points,
                deposit_fee_bps,
                withdraw_fee_bps,
                allow_zero_withdraw,
                started,
                last_settled_time: now.max(config.start_time),
                acc_reward_per_share: 0,
                total_staked: 0,
            },
        );
        storage::set_pool_count(&env, index + 1);

        storage::release_guard(&env);
        Ok(index)
    }

    /// Change a pool's weight and fees. Settles all pools first so the new
    /// weight only applies from now on.
    pub fn set_pool(
        env: Env,
        operator: Address,
        pool_index: u32,
        alloc_points: u32,
        deposit_fee_bps: u32,
        withdraw_fee_bps: u32,
    ) -> Result<(), ContractError> {
        let config = Self::require_operator(&env, &operator)?;
        storage::acquire_guard(&env)?;
        storage::extend_instance_ttl(&env);

        if deposit_fee_bps > MAX_DEPOSIT_FEE_BPS || withdraw_fee_bps > MAX_WITHDRAW_FEE_BPS {
            return Err(ContractError::InvalidFee);
        }

        Self::mass_update_pools(&env, &config)?;

        let mut pool = storage::get_pool(&env, pool_index)?;
        if pool.started {
            let total = storage::get_total_alloc_points(&env) - pool.alloc_points;
            let total = total
                .checked_add(alloc_points)
                .ok_or(ContractError::ArithmeticOverflow)?;
            storage::set_total_alloc_points(&env, total);
        }
        pool.alloc_points = alloc_points;
        pool.deposit_fee_bps = deposit_fee_bps;
        pool.withdraw_fee_bps = withdraw_fee_bps;
        storage::set_pool(&env, pool_index, &pool);

        storage::release_guard(&env);
        Ok(())
    }

    /// Change the default emission rate. Settles all pools at the old rate,
    /// then pins the new rate as the override for the week containing now.
    /// Past weeks with no explicit override are still priced at the new
    /// default next time they are integrated (literal mode); enable
    /// pin_rates_on_settle to freeze them at settlement instead.
    pub fn set_emission_rate(
        env: Env,
        operator: Address,
        new_rate: i128,
    ) -> Result<(), ContractError> {
        let mut config = Self::require_operator(&env, &operator)?;
        storage::acquire_guard(&env)?;
        storage::extend_instance_ttl(&env);

        if new_rate < 0 {
            return Err(ContractError::InvalidConfiguration);
        }

        Self::mass_update_pools(&env, &config)?;

        let week_index = emission::week_of(&config, env.ledger().timestamp());
        storage::set_week_override(&env, week_index, new_rate);

        let old_rate = config.default_rate_per_sec;
        config.default_rate_per_sec = new_rate;
        storage::set_config(&env, &config);

        env.events().publish(
            (symbol_short!("rate"),),
            EmissionRateChangedEvent {
                week_index,
                old_rate,
                new_rate,
            },
        );

        storage::release_guard(&env);
        Ok(())
    }

    /// Transfer the operator role.
    pub fn set_operator(
        env: Env,
        operator: Address,
        new_operator: Address,
    ) -> Result<(), ContractError> {
        let mut config = Self::require_operator(&env, &operator)?;
        storage::acquire_guard(&env)?;
        storage::extend_instance_ttl(&env);
        config.operator = new_operator;
        storage::set_config(&env, &config);
        storage::release_guard(&env);
        Ok(())
    }

    /// Sweep a stray token. The reward token and every pool's stake token
    /// are protected until the emission window has been closed for
    /// RECOVERY_PROTECTION_WINDOW.
    pub fn recover_unsupported(
        env: Env,
        operator: Address,
        asset: Address,
        amount: i128,
        to: Address,
    ) -> Result<(), ContractError> {
        let config = Self::require_operator(&env, &operator)?;
        storage::acquire_guard(&env)?;
        storage::extend_instance_ttl(&env);

        let now = env.ledger().timestamp();
        if now < config.end_time + RECOVERY_PROTECTION_WINDOW {
            if asset == config.reward_token {
                return Err(ContractError::ProtectedAssetWithdrawal);
            }
            let pool_count = storage::get_pool_count(&env);
            for i in 0..pool_count {
                let pool = storage::get_pool(&env, i)?;
                if asset == pool.stake_token {
                    return Err(ContractError::ProtectedAssetWithdrawal);
                }
            }
        }

        token::Client::new(&env, &asset).transfer(
            &env.current_contract_address(),
            &to,
            &amount,
        );
        storage::release_guard(&env);
        Ok(())
    }

    // ========== User Functions ==========

    /// Settle a pool's accumulator up to now. Public and idempotent.
    pub fn settle(env: Env, pool_index: u32) -> Result<Pool, ContractError> {
        let config = storage::get_config(&env)?;
        storage::acquire_guard(&env)?;
        storage::extend_instance_ttl(&env);
        let pool = rewards::update_pool(&env, &config, pool_index)?;
        storage::release_guard(&env);
        Ok(pool)
    }

    /// Deposit stake into a pool. Settles first, pays any pending reward,
    /// then applies the balance change. A zero amount is a bare claim.
    pub fn deposit(
        env: Env,
        user: Address,
        pool_index: u32,
        amount: i128,
    ) -> Result<(), ContractError> {
        user.require_auth();
        let config = storage::get_config(&env)?;
        storage::acquire_guard(&env)?;
        storage::extend_instance_ttl(&env);

        if amount < 0 {
            return Err(ContractError::InvalidAmount);
        }

        let mut pool = rewards::update_pool(&env, &config, pool_index)?;
        let mut position = storage::get_position(&env, &user, pool_index);

        let pending = rewards::calculate_pending(&pool, &position)?;
        if pending > 0 {
            Self::pay_reward(&env, &config, &user, pool_index, pending);
        }

        let mut fee: i128 = 0;
        if amount > 0 {
            let stake_client = token::Client::new(&env, &pool.stake_token);
            stake_client.transfer(&user, &env.current_contract_address(), &amount);

            fee = amount
                .checked_mul(pool.deposit_fee_bps as i128)
                .ok_or(ContractError::ArithmeticOverflow)?
                / BPS_DENOMINATOR;
            if fee > 0 {
                stake_client.transfer(
                    &env.current_contract_address(),
                    &config.fee_collector,
                    &fee,
                );
            }

            let net = amount - fee;
            position.staked_amount = position
                .staked_amount
                .checked_add(net)
                .ok_or(ContractError::ArithmeticOverflow)?;
            pool.total_staked = pool
                .total_staked
                .checked_add(net)
                .ok_or(ContractError::ArithmeticOverflow)?;
            storage::set_pool(&env, pool_index, &pool);
        }

        position.reward_debt =
            rewards::compute_reward_debt(position.staked_amount, pool.acc_reward_per_share)?;
        storage::set_position(&env, &user, pool_index, &position);

        env.events().publish(
            (symbol_short!("deposit"),),
            DepositEvent {
                user,
                pool_index,
                amount,
                fee,
            },
        );

        storage::release_guard(&env);
        Ok(())
    }

    /// Withdraw stake from a pool. Settles first, pays any pending reward,
    /// then returns principal minus the withdraw fee. Whether a zero amount
    /// is a bare claim or an error is per-pool configuration.
    pub fn withdraw(
        env: Env,
        user: Address,
        pool_index: u32,
        amount: i128,
    ) -> Result<(), ContractError> {
        user.require_auth();
        let config = storage::get_config(&env)?;
        storage::acquire_guard(&env)?;
        storage::extend_instance_ttl(&env);

        let mut pool = rewards::update_pool(&env, &config, pool_index)?;
        let mut position = storage::get_position(&env, &user, pool_index);

        if amount < 0 || (amount == 0 && !pool.allow_zero_withdraw) {
            return Err(ContractError::InvalidAmount);
        }
        if amount > position.staked_amount {
            return Err(ContractError::InsufficientStake);
        }

        let pending = rewards::calculate_pending(&pool, &position)?;
        if pending > 0 {
            Self::pay_reward(&env, &config, &user, pool_index, pending);
        }

        let mut fee: i128 = 0;
        if amount > 0 {
            position.staked_amount -= amount;
            pool.total_staked -= amount;
            storage::set_pool(&env, pool_index, &pool);

            fee = amount
                .checked_mul(pool.withdraw_fee_bps as i128)
                .ok_or(ContractError::ArithmeticOverflow)?
                / BPS_DENOMINATOR;
            let stake_client = token::Client::new(&env, &pool.stake_token);
            if fee > 0 {
                stake_client.transfer(&env.current_contract_address(), &config.dev_fund, &fee);
            }
            stake_client.transfer(&env.current_contract_address(), &user, &(amount - fee));
        }

        position.reward_debt =
            rewards::compute_reward_debt(position.staked_amount, pool.acc_reward_per_share)?;
        storage::set_position(&env, &user, pool_index, &position);

        env.events().publish(
            (symbol_short!("withdraw"),),
            WithdrawEvent {
                user,
                pool_index,
                amount,
                fee,
            },
        );

        storage::release_guard(&env);
        Ok(())
    }

    // ========== View Functions ==========

    /// Query unclaimed rewards for a user in a pool.
    pub fn pending_reward(
        env: Env,
        user: Address,
        pool_index: u32,
    ) -> Result<i128, ContractError> {
        let config = storage::get_config(&env)?;
        let pool = storage::get_pool(&env, pool_index)?;
        let position = storage::get_position(&env, &user, pool_index);
        if position.staked_amount == 0 {
            return Ok(0);
        }

        let acc = rewards::simulate_acc_reward(&env, &config, &pool)?;
        let accumulated = position
            .staked_amount
            .checked_mul(acc)
            .ok_or(ContractError::ArithmeticOverflow)?
            / rewards::SCALE;
        let pending = accumulated - position.reward_debt;
        if pending < 0 {
            return Err(ContractError::NegativePending);
        }
        Ok(pending)
    }

    /// Reward units generated over [from, to), clamped to the emission
    /// window.
    pub fn generated_reward(env: Env, from: u64, to: u64) -> Result<i128, ContractError> {
        let config = storage::get_config(&env)?;
        emission::generated_reward(&env, &config, from, to)
    }

    pub fn get_pool(env: Env, pool_index: u32) -> Result<Pool, ContractError> {
        storage::get_pool(&env, pool_index)
    }

    pub fn get_pool_count(env: Env) -> u32 {
        storage::get_pool_count(&env)
    }

    pub fn get_position(env: Env, user: Address, pool_index: u32) -> UserPosition {
        storage::get_position(&env, &user, pool_index)
    }

    pub fn total_alloc_points(env: Env) -> u32 {
        storage::get_total_alloc_points(&env)
    }

    /// Farm's reward-token balance available for payouts.
    pub fn reward_balance(env: Env) -> Result<i128, ContractError> {
        let config = storage::get_config(&env)?;
        let client = token::Client::new(&env, &config.reward_token);
        Ok(client.balance(&env.current_contract_address()))
    }

    // ========== Internal Helpers ==========

    fn require_operator(env: &Env, caller: &Address) -> Result<FarmConfig, ContractError> {
        caller.require_auth();
        let config = storage::get_config(env)?;
        if *caller != config.operator {
            return Err(ContractError::Unauthorized);
        }
        Ok(config)
    }

    fn mass_update_pools(env: &Env, config: &FarmConfig) -> Result<(), ContractError> {
        let pool_count = storage::get_pool_count(env);
        for i in 0..pool_count {
            rewards::update_pool(env, config, i)?;
        }
        Ok(())
    }

    /// Clamp-to-balance payout. Pays min(owed, balance) and never fails the
    /// surrounding operation on a shortfall; a short payment is recorded as
    /// an event only.
    fn pay_reward(env: &Env, config: &FarmConfig, user: &Address, pool_index: u32, owed: i128) {
        let client = token::Client::new(env, &config.reward_token);
        let balance = client.balance(&env.current_contract_address());
        let paid = owed.min(balance);

        if paid > 0 {
            client.transfer(&env.current_contract_address(), user, &paid);
            env.events().publish(
                (symbol_short!("reward"),),
                RewardPaidEvent {
                    user: user.clone(),
                    pool_index,
                    amount: paid,
                },
            );
        }
        if paid < owed {
            env.events().publish(
                (symbol_short!("shortfall"),),
                RewardShortfallEvent {
                    user: user.clone(),
                    pool_index,
                    owed,
                    paid,
                },
            );
        }
    }
}
