//! Error types for the barter service

/// Failures raised by the storage layer itself, independent of any
/// business rule.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage failure: {0}")]
    Backend(#[from] sled::Error),
    #[error("failed to decode stored record: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] minicbor::encode::Error<std::convert::Infallible>),
}

/// Validation failures when building or editing an [`Ad`](crate::ad::Ad).
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AdValidationError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Category is required")]
    MissingCategory,
    #[error("Condition is required")]
    MissingCondition,
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("Unknown condition: {0}")]
    UnknownCondition(String),
}

/// Failures for ad CRUD operations.
#[derive(thiserror::Error, Debug)]
pub enum AdError {
    #[error("Ad not found: {0}")]
    NotFound(String),
    #[error("Only the owner may modify this ad")]
    Forbidden,
    #[error(transparent)]
    Validation(#[from] AdValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures for the proposal creation service and the action engine.
///
/// Every variant except `Store` is a policy violation detected before any
/// mutation. None of them is retried.
#[derive(thiserror::Error, Debug)]
pub enum ProposalError {
    #[error("Ad not found: {0}")]
    AdNotFound(String),
    #[error("Proposal not found: {0}")]
    ProposalNotFound(String),
    #[error("Ad has already been exchanged: {0}")]
    AlreadyExchanged(String),
    #[error("You cannot propose an exchange to yourself")]
    SelfProposal,
    #[error("You can only offer your own ads for exchange")]
    NotYourAd,
    #[error("Proposal has already been handled")]
    AlreadyHandled,
    #[error("You are not allowed to handle this proposal")]
    Forbidden,
    #[error("Unknown action: {0}")]
    InvalidAction(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures when registering a new user.
#[derive(thiserror::Error, Debug)]
pub enum RegistrationError {
    #[error("A username is required")]
    MissingUsername,
    #[error("Username is already taken: {0}")]
    UsernameTaken(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
