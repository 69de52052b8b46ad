//! Service layer API for the barter exchange workflow
//!
//! All mutation of ads, proposals and users funnels through
//! [`BarterService`]. The two operations with cross-record invariants,
//! [`propose_exchange`](BarterService::propose_exchange) and
//! [`handle_proposal`](BarterService::handle_proposal), run their
//! read-check-write sequence inside a sled transaction spanning the ad
//! and proposal trees, so concurrent calls serialize and the loser of a
//! race observes the committed state.
use std::collections::HashSet;
use std::sync::Arc;

use sled::Transactional;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};

use super::ad::{Ad, AdDraft, TimeStamp};
use super::error::{AdError, ProposalError, RegistrationError, StoreError};
use super::policy;
use super::proposal::{ExchangeProposal, ProposalAction, ProposalStatus};
use super::store::{
    ADS_TREE, AdFilter, AdStore, PROPOSALS_TREE, ProposalStore, USERS_TREE, UserStore,
};
use super::user::User;
use super::utils;

pub struct BarterService {
    instance: Arc<sled::Db>,
    ads: AdStore,
    proposals: ProposalStore,
    users: UserStore,
}

impl BarterService {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self, StoreError> {
        let ads = AdStore::new(instance.open_tree(ADS_TREE)?);
        let proposals = ProposalStore::new(instance.open_tree(PROPOSALS_TREE)?);
        let users = UserStore::new(instance.open_tree(USERS_TREE)?);

        Ok(Self {
            instance,
            ads,
            proposals,
            users,
        })
    }

    pub fn ads(&self) -> &AdStore {
        &self.ads
    }

    pub fn proposals(&self) -> &ProposalStore {
        &self.proposals
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.instance.flush()?;
        Ok(())
    }

    /// Register a new user with a unique username.
    pub fn register_user(&self, username: &str) -> Result<User, RegistrationError> {
        if username.trim().is_empty() {
            return Err(RegistrationError::MissingUsername);
        }

        let user = User::new(username);
        // compare_and_swap so a racing registration of the same name
        // cannot slip past a read-then-write check
        if !self.users.insert_new(&user)? {
            return Err(RegistrationError::UsernameTaken(username.to_string()));
        }

        tracing::debug!(user = %user.id, username, "user registered");
        Ok(user)
    }

    pub fn user(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.users.get(username)
    }

    /// Create a new ad owned by `owner`.
    pub fn create_ad(&self, owner: &str, draft: AdDraft) -> Result<Ad, AdError> {
        let ad = draft.build(owner)?;
        self.ads.insert(&ad)?;

        tracing::debug!(ad = %ad.id, owner = %ad.owner, "ad created");
        Ok(ad)
    }

    pub fn get_ad(&self, id: &str) -> Result<Ad, AdError> {
        self.ads
            .get(id)?
            .ok_or_else(|| AdError::NotFound(id.to_string()))
    }

    /// Edit an ad. Only the owner may edit; ownership and the exchange
    /// flag are untouched by edits.
    pub fn update_ad(&self, actor: &str, id: &str, draft: AdDraft) -> Result<Ad, AdError> {
        let current = self.get_ad(id)?;
        if current.owner != actor {
            return Err(AdError::Forbidden);
        }

        let updated = draft.apply_to(&current)?;
        self.ads.insert(&updated)?;
        Ok(updated)
    }

    /// Delete an ad and the proposals referencing it. Only the owner may
    /// delete.
    pub fn delete_ad(&self, actor: &str, id: &str) -> Result<(), AdError> {
        let current = self.get_ad(id)?;
        if current.owner != actor {
            return Err(AdError::Forbidden);
        }

        let dangling = self
            .proposals
            .query(|p| p.ad_sender == id || p.ad_receiver == id)?;
        for proposal in dangling {
            self.proposals.remove(&proposal.id)?;
        }
        self.ads.remove(id)?;
        Ok(())
    }

    /// List ads matching `filter`, in the filter's ordering.
    pub fn list_ads(&self, filter: &AdFilter) -> Result<Vec<Ad>, AdError> {
        Ok(self.ads.query(filter)?)
    }

    /// Propose exchanging the acting user's `sender_ad_id` for
    /// `receiver_ad_id`.
    ///
    /// The receiver ad must exist, not be exchanged yet, and belong to
    /// someone else; the sender ad must exist, belong to the acting user
    /// and not be exchanged. Checks run against current state inside the
    /// transaction, so an ad exchanged between read and write is caught.
    pub fn propose_exchange(
        &self,
        acting_user: &str,
        receiver_ad_id: &str,
        sender_ad_id: &str,
        comment: &str,
    ) -> Result<ExchangeProposal, ProposalError> {
        // minted outside the closure so a transaction retry keeps the id
        let proposal_id = utils::mint_id(utils::PROPOSAL_HRP);
        let created_at = TimeStamp::new();

        let outcome = (&self.ads.tree, &self.proposals.tree).transaction(
            |(ads, proposals): &(TransactionalTree, TransactionalTree)|
             -> ConflictableTransactionResult<ExchangeProposal, ProposalError> {
                let receiver = tx_load_ad(ads, receiver_ad_id)?;
                if receiver.is_exchanged {
                    return Err(abort(ProposalError::AlreadyExchanged(receiver.id)));
                }
                if receiver.owner == acting_user {
                    return Err(abort(ProposalError::SelfProposal));
                }

                let sender = tx_load_ad(ads, sender_ad_id)?;
                if sender.owner != acting_user {
                    return Err(abort(ProposalError::NotYourAd));
                }
                if sender.is_exchanged {
                    return Err(abort(ProposalError::AlreadyExchanged(sender.id)));
                }

                let proposal = ExchangeProposal {
                    id: proposal_id.clone(),
                    ad_sender: sender.id,
                    ad_receiver: receiver.id,
                    comment: comment.to_string(),
                    status: ProposalStatus::Pending,
                    created_at: created_at.clone(),
                };
                tx_put_proposal(proposals, &proposal)?;
                Ok(proposal)
            },
        );
        let outcome = unabort(outcome);

        if let Ok(proposal) = &outcome {
            tracing::debug!(
                proposal = %proposal.id,
                sender = %proposal.ad_sender,
                receiver = %proposal.ad_receiver,
                "exchange proposal created"
            );
        }
        outcome
    }

    /// Decide a pending proposal. Only the receiver ad's owner may act,
    /// and only once.
    ///
    /// Accepting marks both linked ads as exchanged; the proposal update
    /// and the ad updates commit in a single transaction. Rejecting
    /// touches no ad.
    pub fn handle_proposal(
        &self,
        acting_user: &str,
        proposal_id: &str,
        action: ProposalAction,
    ) -> Result<ExchangeProposal, ProposalError> {
        let outcome = (&self.ads.tree, &self.proposals.tree).transaction(
            |(ads, proposals): &(TransactionalTree, TransactionalTree)|
             -> ConflictableTransactionResult<ExchangeProposal, ProposalError> {
                let mut proposal = tx_load_proposal(proposals, proposal_id)?;

                if proposal.status != ProposalStatus::Pending {
                    return Err(abort(ProposalError::AlreadyHandled));
                }

                let receiver = tx_load_ad(ads, &proposal.ad_receiver)?;
                if !policy::is_receiver_owner(&receiver, acting_user) {
                    return Err(abort(ProposalError::Forbidden));
                }

                match action {
                    ProposalAction::Accept => {
                        proposal.status = ProposalStatus::Accepted;

                        let mut receiver = receiver;
                        receiver.is_exchanged = true;
                        tx_put_ad(ads, &receiver)?;

                        // A proposal written directly to the store may
                        // carry the same ad on both sides; mark it once.
                        if proposal.ad_sender != proposal.ad_receiver {
                            let mut sender = tx_load_ad(ads, &proposal.ad_sender)?;
                            sender.is_exchanged = true;
                            tx_put_ad(ads, &sender)?;
                        }
                    }
                    ProposalAction::Reject => {
                        proposal.status = ProposalStatus::Rejected;
                    }
                }

                tx_put_proposal(proposals, &proposal)?;
                Ok(proposal)
            },
        );
        let outcome = unabort(outcome);

        if let Ok(proposal) = &outcome {
            tracing::debug!(
                proposal = %proposal.id,
                status = %proposal.status,
                "proposal handled"
            );
        }
        outcome
    }

    /// String-action entry point for callers sitting at an HTTP or form
    /// boundary. Parses the action once, then delegates to
    /// [`handle_proposal`](Self::handle_proposal).
    pub fn handle_proposal_action(
        &self,
        acting_user: &str,
        proposal_id: &str,
        action: &str,
    ) -> Result<ExchangeProposal, ProposalError> {
        let action: ProposalAction = action.parse()?;
        self.handle_proposal(acting_user, proposal_id, action)
    }

    pub fn proposal(&self, id: &str) -> Result<ExchangeProposal, ProposalError> {
        self.proposals
            .get(id)?
            .ok_or_else(|| ProposalError::ProposalNotFound(id.to_string()))
    }

    /// Proposals offering one of `user`'s ads, newest first.
    pub fn sent_proposals(
        &self,
        user: &str,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<ExchangeProposal>, ProposalError> {
        let mine = self.ads_owned_by(user)?;
        Ok(self.proposals.query(|p| {
            mine.contains(&p.ad_sender) && status.is_none_or(|s| p.status == s)
        })?)
    }

    /// Proposals requesting one of `user`'s ads, newest first.
    pub fn received_proposals(
        &self,
        user: &str,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<ExchangeProposal>, ProposalError> {
        let mine = self.ads_owned_by(user)?;
        Ok(self.proposals.query(|p| {
            mine.contains(&p.ad_receiver) && status.is_none_or(|s| p.status == s)
        })?)
    }

    fn ads_owned_by(&self, user: &str) -> Result<HashSet<String>, StoreError> {
        let filter = AdFilter::new().owner(user);
        Ok(self
            .ads
            .query(&filter)?
            .into_iter()
            .map(|ad| ad.id)
            .collect())
    }
}

fn abort(err: ProposalError) -> ConflictableTransactionError<ProposalError> {
    ConflictableTransactionError::Abort(err)
}

fn unabort<T>(result: Result<T, TransactionError<ProposalError>>) -> Result<T, ProposalError> {
    match result {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(err)) => Err(err),
        Err(TransactionError::Storage(err)) => Err(StoreError::from(err).into()),
    }
}

fn tx_load_ad(
    ads: &TransactionalTree,
    id: &str,
) -> Result<Ad, ConflictableTransactionError<ProposalError>> {
    match ads.get(id.as_bytes())? {
        Some(raw) => minicbor::decode(&raw).map_err(|e| abort(StoreError::from(e).into())),
        None => Err(abort(ProposalError::AdNotFound(id.to_string()))),
    }
}

fn tx_load_proposal(
    proposals: &TransactionalTree,
    id: &str,
) -> Result<ExchangeProposal, ConflictableTransactionError<ProposalError>> {
    match proposals.get(id.as_bytes())? {
        Some(raw) => minicbor::decode(&raw).map_err(|e| abort(StoreError::from(e).into())),
        None => Err(abort(ProposalError::ProposalNotFound(id.to_string()))),
    }
}

fn tx_put_ad(
    ads: &TransactionalTree,
    ad: &Ad,
) -> Result<(), ConflictableTransactionError<ProposalError>> {
    let raw = minicbor::to_vec(ad).map_err(|e| abort(StoreError::from(e).into()))?;
    ads.insert(ad.id.as_bytes(), raw)?;
    Ok(())
}

fn tx_put_proposal(
    proposals: &TransactionalTree,
    proposal: &ExchangeProposal,
) -> Result<(), ConflictableTransactionError<ProposalError>> {
    let raw = minicbor::to_vec(proposal).map_err(|e| abort(StoreError::from(e).into()))?;
    proposals.insert(proposal.id.as_bytes(), raw)?;
    Ok(())
}
