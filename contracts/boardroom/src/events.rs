use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakedEvent {
    pub member: Address,
    pub amount: i128,
    pub epoch: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawnEvent {
    pub member: Address,
    pub amount: i128,
    pub epoch: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardPaidEvent {
    pub member: Address,
    pub amount: i128,
    pub epoch: u64,
}

/// Emitted when the clamp-to-balance payout path pays less than the settled
/// reward.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardShortfallEvent {
    pub member: Address,
    pub owed: i128,
    pub paid: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardAddedEvent {
    pub amount: i128,
    pub epoch: u64,
    pub snapshot_index: u64,
}
