//! Access checks and user-facing result messages
//!
//! Pure lookups only. The action engine consults [`is_receiver_owner`];
//! callers rendering a response may map an engine outcome to text via
//! [`ActionCode`]. Nothing in here mutates state.
use super::ad::Ad;
use super::error::ProposalError;
use super::proposal::{ExchangeProposal, ProposalStatus};

/// Whether `actor` is the owner of the receiver ad and may therefore
/// decide the proposal's outcome.
pub fn is_receiver_owner(receiver_ad: &Ad, actor: &str) -> bool {
    receiver_ad.owner == actor
}

/// Outcome kinds of a proposal action, used to pick a user-facing
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCode {
    Accepted,
    Rejected,
    AlreadyHandled,
    Forbidden,
    Invalid,
    Unknown,
}

impl ActionCode {
    pub fn from_outcome(outcome: &Result<ExchangeProposal, ProposalError>) -> Self {
        match outcome {
            Ok(proposal) if proposal.status == ProposalStatus::Accepted => ActionCode::Accepted,
            Ok(_) => ActionCode::Rejected,
            Err(ProposalError::AlreadyHandled) => ActionCode::AlreadyHandled,
            Err(ProposalError::Forbidden) => ActionCode::Forbidden,
            Err(ProposalError::InvalidAction(_)) => ActionCode::Invalid,
            Err(_) => ActionCode::Unknown,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ActionCode::Accepted => "You accepted the proposal.",
            ActionCode::Rejected => "You rejected the proposal.",
            ActionCode::AlreadyHandled => "The proposal has already been handled.",
            ActionCode::Forbidden => "You cannot handle this proposal.",
            ActionCode::Invalid => "Invalid action.",
            ActionCode::Unknown => "Unknown result.",
        }
    }
}
