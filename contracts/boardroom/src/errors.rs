use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    Unauthorized = 3,
    InvalidAmount = 4,
    InsufficientStake = 5,
    StillLocked = 6,
    InvalidLockup = 7,
    InvalidConfiguration = 8,
    DivisionByZeroGuard = 9,
    ArithmeticOverflow = 10,
    ProtectedAssetWithdrawal = 11,
    ReentrantCall = 12,
    SameLedgerReentry = 13,
}
