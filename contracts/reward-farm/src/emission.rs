use soroban_sdk::Env;

use crate::errors::ContractError;
use crate::storage::{self, FarmConfig};

/// Emission buckets are one week wide, aligned to the farm start time.
pub const WEEK: u64 = 604_800;

/// Total reward units generated over `[from, to)`, integrated week bucket
/// by week bucket. Each bucket is priced at its weekly override if one is
/// stored, otherwise at `default_rate`. The caller is responsible for
/// clamping the interval to the emission window; `from` must not precede
/// `genesis`.
///
/// Note: buckets with no stored override are priced at the default rate in
/// effect *now*, so unsettled history repriced by a later default-rate
/// change is the documented behavior of the literal mode.
pub fn segment_reward<F>(
    from: u64,
    to: u64,
    genesis: u64,
    default_rate: i128,
    override_for: F,
) -> Result<i128, ContractError>
where
    F: Fn(u64) -> Option<i128>,
{
    if from >= to {
        return Ok(0);
    }

    let mut total: i128 = 0;
    let mut cursor = from;
    while cursor < to {
        let week_index = (cursor - genesis) / WEEK;
        let bucket_end = genesis
            .checked_add(
                week_index
                    .checked_add(1)
                    .and_then(|w| w.checked_mul(WEEK))
                    .ok_or(ContractError::ArithmeticOverflow)?,
            )
            .ok_or(ContractError::ArithmeticOverflow)?;
        let segment_end = bucket_end.min(to);

        let rate = override_for(week_index).unwrap_or(default_rate);
        let duration = (segment_end - cursor) as i128;
        let generated = duration
            .checked_mul(rate)
            .ok_or(ContractError::ArithmeticOverflow)?;
        total = total
            .checked_add(generated)
            .ok_or(ContractError::ArithmeticOverflow)?;

        cursor = segment_end;
    }
    Ok(total)
}

/// Week index of a timestamp relative to the farm start time.
pub fn week_of(config: &FarmConfig, timestamp: u64) -> u64 {
    let t = timestamp.max(config.start_time);
    (t - config.start_time) / WEEK
}

/// Reward units generated over `[from, to)` after clamping to the farm's
/// emission window. Intervals entirely outside the window generate zero.
pub fn generated_reward(
    env: &Env,
    config: &FarmConfig,
    from: u64,
    to: u64,
) -> Result<i128, ContractError> {
    let from = from.max(config.start_time);
    let to = to.min(config.end_time);
    segment_reward(from, to, config.start_time, config.default_rate_per_sec, |week| {
        storage::get_week_override(env, week)
    })
}

/// Freeze the current default rate into every un-overridden week bucket the
/// interval `[from, to)` touches. Used by settlements when
/// `pin_rates_on_settle` is enabled, so already-integrated history can no
/// longer be repriced by a later default-rate change.
pub fn pin_default_rate(env: &Env, config: &FarmConfig, from: u64, to: u64) {
    let from = from.max(config.start_time);
    let to = to.min(config.end_time);
    if from >= to {
        return;
    }
    let first = (from - config.start_time) / WEEK;
    let last = (to - 1 - config.start_time) / WEEK;
    for week in first..=last {
        if storage::get_week_override(env, week).is_none() {
            storage::set_week_override(env, week, config.default_rate_per_sec);
        }
    }
}
