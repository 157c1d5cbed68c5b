#![no_std]

mod errors;
mod events;
mod storage;

#[cfg(test)]
mod test;

use errors::ContractError;
use events::{
    RewardAddedEvent, RewardPaidEvent, RewardShortfallEvent, StakedEvent, WithdrawnEvent,
};
use soroban_sdk::{contract, contractimpl, symbol_short, token, Address, Env};
use storage::{BoardroomConfig, MemberSeat, RewardSnapshot};

/// Precision multiplier for reward per share (1e18).
const SCALE: i128 = 1_000_000_000_000_000_000;

/// Upper bound on either lockup, in epochs (two weeks of 6-hour epochs).
const MAX_LOCKUP_EPOCHS: u64 = 56;

#[contract]
pub struct BoardroomContract;

#[contractimpl]
impl BoardroomContract {
    // ========== Admin Functions ==========

    /// One-time initialization. Writes the genesis reward snapshot.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        env: Env,
        operator: Address,
        stake_token: Address,
        reward_token: Address,
        epoch_start: u64,
        epoch_duration: u64,
        withdraw_lockup_epochs: u64,
        reward_lockup_epochs: u64,
    ) -> Result<(), ContractError> {
        if storage::has_config(&env) {
            return Err(ContractError::AlreadyInitialized);
        }
        if epoch_duration == 0 {
            return Err(ContractError::InvalidConfiguration);
        }
        Self::validate_lockup(withdraw_lockup_epochs, reward_lockup_epochs)?;

        operator.require_auth();

        storage::set_config(
            &env,
            &BoardroomConfig {
                operator,
                stake_token,
                reward_token,
                epoch_start,
                epoch_duration,
                withdraw_lockup_epochs,
                reward_lockup_epochs,
            },
        );
        storage::set_total_staked(&env, 0);
        storage::push_snapshot(
            &env,
            &RewardSnapshot {
                epoch: 0,
                reward_received: 0,
                reward_per_share: 0,
            },
        );
        storage::extend_instance_ttl(&env);

        Ok(())
    }

    /// Change both lockups. Requires 0 < reward <= withdraw <= 56.
    pub fn set_lockup(
        env: Env,
        operator: Address,
        withdraw_lockup_epochs: u64,
        reward_lockup_epochs: u64,
    ) -> Result<(), ContractError> {
        let mut config = Self::require_operator(&env, &operator)?;
        storage::acquire_guard(&env)?;
        storage::extend_instance_ttl(&env);

        Self::validate_lockup(withdraw_lockup_epochs, reward_lockup_epochs)?;
        config.withdraw_lockup_epochs = withdraw_lockup_epochs;
        config.reward_lockup_epochs = reward_lockup_epochs;
        storage::set_config(&env, &config);
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

    /// Inject a reward tranche: appends exactly one snapshot and pulls the
    /// reward token from the operator into the boardroom's custody.
    pub fn allocate_seigniorage(
        env: Env,
        operator: Address,
        amount: i128,
    ) -> Result<(), ContractError> {
        let config = Self::require_operator(&env, &operator)?;
        storage::acquire_guard(&env)?;
        storage::check_and_mark_ledger(&env, &operator)?;
        storage::extend_instance_ttl(&env);

        if amount <= 0 {
            return Err(ContractError::InvalidAmount);
        }
        let total_staked = storage::get_total_staked(&env);
        if total_staked == 0 {
            return Err(ContractError::DivisionByZeroGuard);
        }

        let latest = Self::latest_snapshot_internal(&env)?;
        let per_share_delta = amount
            .checked_mul(SCALE)
            .ok_or(ContractError::ArithmeticOverflow)?
            / total_staked;
        let reward_per_share = latest
            .reward_per_share
            .checked_add(per_share_delta)
            .ok_or(ContractError::ArithmeticOverflow)?;

        let epoch = Self::epoch_at(&config, env.ledger().timestamp());
        let index = storage::push_snapshot(
            &env,
            &RewardSnapshot {
                epoch,
                reward_received: amount,
                reward_per_share,
            },
        );

        token::Client::new(&env, &config.reward_token).transfer(
            &operator,
            &env.current_contract_address(),
            &amount,
        );

        env.events().publish(
            (symbol_short!("seignior"),),
            RewardAddedEvent {
                amount,
                epoch,
                snapshot_index: index,
            },
        );

        storage::release_guard(&env);
        Ok(())
    }

    /// Sweep a stray token. The staked share and the reward token are never
    /// sweepable.
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

        if asset == config.stake_token || asset == config.reward_token {
            return Err(ContractError::ProtectedAssetWithdrawal);
        }
        token::Client::new(&env, &asset).transfer(
            &env.current_contract_address(),
            &to,
            &amount,
        );
        storage::release_guard(&env);
        Ok(())
    }

    // ========== Member Functions ==========

    /// Stake governance shares. Resets the epoch timer, so topping up pushes
    /// out both the withdraw and the reward lockup.
    pub fn stake(env: Env, member: Address, amount: i128) -> Result<(), ContractError> {
        member.require_auth();
        let config = storage::get_config(&env)?;
        storage::acquire_guard(&env)?;
        storage::check_and_mark_ledger(&env, &member)?;
        storage::extend_instance_ttl(&env);

        if amount <= 0 {
            return Err(ContractError::InvalidAmount);
        }

        let mut seat = Self::settle_seat(&env, &member)?;

        token::Client::new(&env, &config.stake_token).transfer(
            &member,
            &env.current_contract_address(),
            &amount,
        );

        let balance = storage::get_balance(&env, &member)
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;
        storage::set_balance(&env, &member, balance);
        let total = storage::get_total_staked(&env)
            .checked_add(amount)
            .ok_or(ContractError::ArithmeticOverflow)?;
        storage::set_total_staked(&env, total);

        let epoch = Self::epoch_at(&config, env.ledger().timestamp());
        seat.epoch_timer_start = epoch;
        storage::set_seat(&env, &member, &seat);

        env.events().publish(
            (symbol_short!("staked"),),
            StakedEvent {
                member,
                amount,
                epoch,
            },
        );

        storage::release_guard(&env);
        Ok(())
    }

    /// Withdraw principal. Locked until the withdraw lockup elapses, and the
    /// claim path runs first: settled rewards that are themselves still
    /// locked abort the whole withdraw.
    pub fn withdraw(env: Env, member: Address, amount: i128) -> Result<(), ContractError> {
        member.require_auth();
        let config = storage::get_config(&env)?;
        storage::acquire_guard(&env)?;
        storage::check_and_mark_ledger(&env, &member)?;
        storage::extend_instance_ttl(&env);

        Self::withdraw_internal(&env, &config, &member, amount)?;

        storage::release_guard(&env);
        Ok(())
    }

    /// Withdraw the full balance.
    pub fn exit(env: Env, member: Address) -> Result<(), ContractError> {
        member.require_auth();
        let config = storage::get_config(&env)?;
        storage::acquire_guard(&env)?;
        storage::check_and_mark_ledger(&env, &member)?;
        storage::extend_instance_ttl(&env);

        let balance = storage::get_balance(&env, &member);
        Self::withdraw_internal(&env, &config, &member, balance)?;

        storage::release_guard(&env);
        Ok(())
    }

    /// Claim settled rewards. Locked until the reward lockup elapses; a
    /// successful claim restarts the epoch timer.
    pub fn claim_reward(env: Env, member: Address) -> Result<i128, ContractError> {
        member.require_auth();
        let config = storage::get_config(&env)?;
        storage::acquire_guard(&env)?;
        storage::check_and_mark_ledger(&env, &member)?;
        storage::extend_instance_ttl(&env);

        let paid = Self::claim_internal(&env, &config, &member)?;

        storage::release_guard(&env);
        Ok(paid)
    }

    // ========== View Functions ==========

    pub fn current_epoch(env: Env) -> Result<u64, ContractError> {
        let config = storage::get_config(&env)?;
        Ok(Self::epoch_at(&config, env.ledger().timestamp()))
    }

    /// Accrued-but-unclaimed reward for a member, settled against the latest
    /// snapshot. O(1) in the history length.
    pub fn earned(env: Env, member: Address) -> Result<i128, ContractError> {
        let latest = Self::latest_snapshot_internal(&env)?;
        let seat = storage::get_seat(&env, &member);
        let seen = storage::get_snapshot(&env, seat.last_snapshot_index)?;
        let balance = storage::get_balance(&env, &member);

        let delta = latest
            .reward_per_share
            .checked_sub(seen.reward_per_share)
            .ok_or(ContractError::ArithmeticOverflow)?;
        let accrued = balance
            .checked_mul(delta)
            .ok_or(ContractError::ArithmeticOverflow)?
            / SCALE;
        seat.reward_earned
            .checked_add(accrued)
            .ok_or(ContractError::ArithmeticOverflow)
    }

    pub fn can_withdraw(env: Env, member: Address) -> Result<bool, ContractError> {
        let config = storage::get_config(&env)?;
        let seat = storage::get_seat(&env, &member);
        let epoch = Self::epoch_at(&config, env.ledger().timestamp());
        Ok(seat.epoch_timer_start + config.withdraw_lockup_epochs <= epoch)
    }

    pub fn can_claim_reward(env: Env, member: Address) -> Result<bool, ContractError> {
        let config = storage::get_config(&env)?;
        let seat = storage::get_seat(&env, &member);
        let epoch = Self::epoch_at(&config, env.ledger().timestamp());
        Ok(seat.epoch_timer_start + config.reward_lockup_epochs <= epoch)
    }

    pub fn balance_of(env: Env, member: Address) -> i128 {
        storage::get_balance(&env, &member)
    }

    pub fn total_staked(env: Env) -> i128 {
        storage::get_total_staked(&env)
    }

    pub fn snapshot_count(env: Env) -> u64 {
        storage::get_snapshot_count(&env)
    }

    pub fn get_snapshot(env: Env, index: u64) -> Result<RewardSnapshot, ContractError> {
        storage::get_snapshot(&env, index)
    }

    pub fn latest_snapshot(env: Env) -> Result<RewardSnapshot, ContractError> {
        Self::latest_snapshot_internal(&env)
    }

    pub fn get_seat(env: Env, member: Address) -> MemberSeat {
        storage::get_seat(&env, &member)
    }

    // ========== Internal Helpers ==========

    fn require_operator(env: &Env, caller: &Address) -> Result<BoardroomConfig, ContractError> {
        caller.require_auth();
        let config = storage::get_config(env)?;
        if *caller != config.operator {
            return Err(ContractError::Unauthorized);
        }
        Ok(config)
    }

    fn validate_lockup(withdraw_epochs: u64, reward_epochs: u64) -> Result<(), ContractError> {
        if reward_epochs == 0
            || reward_epochs > withdraw_epochs
            || withdraw_epochs > MAX_LOCKUP_EPOCHS
        {
            return Err(ContractError::InvalidLockup);
        }
        Ok(())
    }

    fn epoch_at(config: &BoardroomConfig, timestamp: u64) -> u64 {
        if timestamp < config.epoch_start {
            return 0;
        }
        (timestamp - config.epoch_start) / config.epoch_duration
    }

    fn latest_snapshot_internal(env: &Env) -> Result<RewardSnapshot, ContractError> {
        let count = storage::get_snapshot_count(env);
        if count == 0 {
            return Err(ContractError::NotInitialized);
        }
        storage::get_snapshot(env, count - 1)
    }

    /// Roll the member's seat forward to the latest snapshot, banking the
    /// accrued delta into reward_earned.
    fn settle_seat(env: &Env, member: &Address) -> Result<MemberSeat, ContractError> {
        let count = storage::get_snapshot_count(env);
        let latest_index = count - 1;
        let latest = storage::get_snapshot(env, latest_index)?;
        let mut seat = storage::get_seat(env, member);
        let seen = storage::get_snapshot(env, seat.last_snapshot_index)?;
        let balance = storage::get_balance(env, member);

        let delta = latest
            .reward_per_share
            .checked_sub(seen.reward_per_share)
            .ok_or(ContractError::ArithmeticOverflow)?;
        let accrued = balance
            .checked_mul(delta)
            .ok_or(ContractError::ArithmeticOverflow)?
            / SCALE;
        seat.reward_earned = seat
            .reward_earned
            .checked_add(accrued)
            .ok_or(ContractError::ArithmeticOverflow)?;
        seat.last_snapshot_index = latest_index;
        storage::set_seat(env, member, &seat);
        Ok(seat)
    }

    fn withdraw_internal(
        env: &Env,
        config: &BoardroomConfig,
        member: &Address,
        amount: i128,
    ) -> Result<(), ContractError> {
        if amount <= 0 {
            return Err(ContractError::InvalidAmount);
        }
        let balance = storage::get_balance(env, member);
        if amount > balance {
            return Err(ContractError::InsufficientStake);
        }

        let seat = storage::get_seat(env, member);
        let epoch = Self::epoch_at(config, env.ledger().timestamp());
        if seat.epoch_timer_start + config.withdraw_lockup_epochs > epoch {
            return Err(ContractError::StillLocked);
        }

        // Claim before releasing principal: a still-locked reward aborts
        // the whole withdraw.
        Self::claim_internal(env, config, member)?;

        storage::set_balance(env, member, balance - amount);
        storage::set_total_staked(env, storage::get_total_staked(env) - amount);

        token::Client::new(env, &config.stake_token).transfer(
            &env.current_contract_address(),
            member,
            &amount,
        );

        env.events().publish(
            (symbol_short!("withdrawn"),),
            WithdrawnEvent {
                member: member.clone(),
                amount,
                epoch,
            },
        );
        Ok(())
    }

    fn claim_internal(
        env: &Env,
        config: &BoardroomConfig,
        member: &Address,
    ) -> Result<i128, ContractError> {
        let mut seat = Self::settle_seat(env, member)?;
        if seat.reward_earned <= 0 {
            return Ok(0);
        }

        let epoch = Self::epoch_at(config, env.ledger().timestamp());
        if seat.epoch_timer_start + config.reward_lockup_epochs > epoch {
            return Err(ContractError::StillLocked);
        }

        let owed = seat.reward_earned;
        seat.reward_earned = 0;
        seat.epoch_timer_start = epoch;
        storage::set_seat(env, member, &seat);

        // Clamp to custody balance. The boardroom is funded by direct
        // transfer-in per snapshot so a shortfall is not expected, but the
        // payout policy stays the same.
        let client = token::Client::new(env, &config.reward_token);
        let available = client.balance(&env.current_contract_address());
        let paid = owed.min(available);
        if paid > 0 {
            client.transfer(&env.current_contract_address(), member, &paid);
            env.events().publish(
                (symbol_short!("claimed"),),
                RewardPaidEvent {
                    member: member.clone(),
                    amount: paid,
                    epoch,
                },
            );
        }
        if paid < owed {
            env.events().publish(
                (symbol_short!("shortfall"),),
                RewardShortfallEvent {
                    member: member.clone(),
                    owed,
                    paid,
                },
            );
        }
        Ok(paid)
    }
}
