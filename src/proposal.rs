//! Exchange proposal entity and its lifecycle types
use super::ad::TimeStamp;
use super::error::ProposalError;
use super::utils;
use chrono::Utc;
use std::str::FromStr;

/// Lifecycle states of a proposal. `Pending` is the initial state,
/// `Accepted` and `Rejected` are terminal.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Eq, PartialEq, Clone, Copy)]
pub enum ProposalStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Accepted,
    #[n(2)]
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }

    /// Boundary helper for status filters. Unknown values yield `None`,
    /// which callers treat as "no filter".
    pub fn from_slug(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProposalStatus::Pending),
            "accepted" => Some(ProposalStatus::Accepted),
            "rejected" => Some(ProposalStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of decisions the receiving party can take on a pending
/// proposal. Free-form action strings are parsed exactly once at the
/// boundary via [`FromStr`]; anything outside the set is `InvalidAction`.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum ProposalAction {
    Accept,
    Reject,
}

impl ProposalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalAction::Accept => "accept",
            ProposalAction::Reject => "reject",
        }
    }
}

impl FromStr for ProposalAction {
    type Err = ProposalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(ProposalAction::Accept),
            "reject" => Ok(ProposalAction::Reject),
            unknown => Err(ProposalError::InvalidAction(unknown.to_string())),
        }
    }
}

impl std::fmt::Display for ProposalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to trade `ad_sender` for `ad_receiver`. Keyed in storage by
/// `id`. The receiver ad's owner alone decides the outcome.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Eq, PartialEq, Clone)]
pub struct ExchangeProposal {
    #[n(0)]
    pub id: String, // bech32 encoded uuid7, `prop_` prefix
    #[n(1)]
    pub ad_sender: String, // ad offered by the proposing user
    #[n(2)]
    pub ad_receiver: String, // ad being requested
    #[n(3)]
    pub comment: String,
    #[n(4)]
    pub status: ProposalStatus,
    #[n(5)]
    pub created_at: TimeStamp<Utc>,
}

impl ExchangeProposal {
    /// Direct construction with a fresh id and `Pending` status. The
    /// owner checks live in the creation service, not here, so a
    /// proposal built this way may pair any two ads.
    pub fn new(ad_sender: &str, ad_receiver: &str, comment: &str) -> Self {
        Self {
            id: utils::mint_id(utils::PROPOSAL_HRP),
            ad_sender: ad_sender.to_string(),
            ad_receiver: ad_receiver.to_string(),
            comment: comment.to_string(),
            status: ProposalStatus::Pending,
            created_at: TimeStamp::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ProposalStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_proposal_starts_pending() {
        let proposal = ExchangeProposal::new("ad_one", "ad_two", "Swap?");

        assert!(proposal.id.starts_with("prop_1"));
        assert!(proposal.is_pending());
        assert_eq!(proposal.comment, "Swap?");
    }

    #[test]
    fn action_parses_only_the_closed_set() {
        assert_eq!("accept".parse::<ProposalAction>().unwrap(), ProposalAction::Accept);
        assert_eq!("reject".parse::<ProposalAction>().unwrap(), ProposalAction::Reject);

        let err = "approve".parse::<ProposalAction>().unwrap_err();
        assert!(matches!(err, ProposalError::InvalidAction(s) if s == "approve"));
    }

    #[test]
    fn direct_construction_permits_same_ad_on_both_sides() {
        // The public creation path always rejects this pairing via the
        // owner check; the model itself does not.
        let proposal = ExchangeProposal::new("ad_one", "ad_one", "");
        assert_eq!(proposal.ad_sender, proposal.ad_receiver);
        assert!(proposal.is_pending());
    }

    #[test]
    fn proposal_cbor_roundtrip() {
        let original = ExchangeProposal::new("ad_one", "ad_two", "Swap?");

        let encoding = minicbor::to_vec(&original).unwrap();
        let decode: ExchangeProposal = minicbor::decode(&encoding).unwrap();

        assert_eq!(original, decode);
    }
}
