//! Core domain logic for an ad bartering service.
//!
//! Users list ads, offer one of their own ads in exchange for someone
//! else's, and the receiving owner accepts or rejects the proposal.
//! Accepting atomically marks both ads as exchanged; every decision is
//! single-shot. HTTP routing, templating and authentication live in
//! collaborating crates; this one owns the records, the rules and the
//! storage.

pub mod ad;
pub mod error;
pub mod policy;
pub mod proposal;
pub mod service;
pub mod store;
pub mod user;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::ad::{AdDraft, Category, Condition};
    use super::proposal::ExchangeProposal;

    #[test]
    fn ad_and_proposal_construction() {
        let ad = AdDraft::new()
            .set_title("Phone")
            .set_description("Works fine, a few scratches.")
            .set_category(Category::Electronics)
            .set_condition(Condition::Used)
            .build("user_owner")
            .unwrap();
        assert_eq!(ad.title, "Phone");
        assert_eq!(ad.condition, Condition::Used);
        assert!(!ad.is_exchanged);

        let proposal = ExchangeProposal::new(&ad.id, "ad_other", "Swap?");
        assert!(proposal.is_pending());
    }
}
