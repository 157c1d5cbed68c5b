use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositEvent {
    pub user: Address,
    pub pool_index: u32,
    pub amount: i128,
    pub fee: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawEvent {
    pub user: Address,
    pub pool_index: u32,
    pub amount: i128,
    pub fee: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardPaidEvent {
    pub user: Address,
    pub pool_index: u32,
    pub amount: i128,
}

/// Emitted when the clamp-to-balance payout path pays less than the settled
/// pending amount. The shortfall is otherwise unrecorded.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardShortfallEvent {
    pub user: Address,
    pub pool_index: u32,
    pub owed: i128,
    pub paid: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmissionRateChangedEvent {
    pub week_index: u64,
    pub old_rate: i128,
    pub new_rate: i128,
}
