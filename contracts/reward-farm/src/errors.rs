use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    DuplicatePool = 4,
    PoolNotFound = 5,
    InvalidAmount = 6,
    InsufficientStake = 7,
    InvalidFee = 8,
    InvalidConfiguration = 9,
    DivisionByZeroGuard = 10,
    ArithmeticOverflow = 11,
    ProtectedAssetWithdrawal = 12,
    ReentrantCall = 13,
    NegativePending = 14,
}
