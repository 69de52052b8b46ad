//! Sled-backed stores for ads, proposals and users
//!
//! Each entity lives in its own named tree and is encoded as CBOR.
//! Single-record operations go through these stores; the read-check-write
//! sequences that span records are owned by the service layer, which runs
//! them inside a transaction over the underlying trees.
use super::ad::{Ad, Category, Condition};
use super::error::StoreError;
use super::proposal::ExchangeProposal;
use super::user::User;
use sled::Tree;

pub(crate) const ADS_TREE: &str = "ads";
pub(crate) const PROPOSALS_TREE: &str = "proposals";
pub(crate) const USERS_TREE: &str = "users";

/// Sort order for ad listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdOrdering {
    #[default]
    NewestFirst,
    OldestFirst,
    TitleAsc,
    TitleDesc,
}

/// Query parameters for ad listings: free-text search over title and
/// description, exact category/condition match, optional owner
/// restriction.
#[derive(Debug, Clone, Default)]
pub struct AdFilter {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub condition: Option<Condition>,
    pub owner: Option<String>,
    pub ordering: AdOrdering,
}

impl AdFilter {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn search(mut self, text: &str) -> Self {
        self.search = Some(text.to_string());
        self
    }
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
    pub fn owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }
    pub fn ordering(mut self, ordering: AdOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Whether `ad` satisfies every set criterion. The search term is a
    /// case-insensitive substring match on title or description.
    pub fn matches(&self, ad: &Ad) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !ad.title.to_lowercase().contains(&needle)
                && !ad.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(category) = self.category {
            if ad.category != category {
                return false;
            }
        }
        if let Some(condition) = self.condition {
            if ad.condition != condition {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if &ad.owner != owner {
                return false;
            }
        }
        true
    }

    pub(crate) fn sort(&self, ads: &mut [Ad]) {
        match self.ordering {
            AdOrdering::NewestFirst => ads.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            AdOrdering::OldestFirst => ads.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            AdOrdering::TitleAsc => ads.sort_by(|a, b| a.title.cmp(&b.title)),
            AdOrdering::TitleDesc => ads.sort_by(|a, b| b.title.cmp(&a.title)),
        }
    }
}

/// Persistence for [`Ad`] records, keyed by ad id.
pub struct AdStore {
    pub(crate) tree: Tree,
}

impl AdStore {
    pub(crate) fn new(tree: Tree) -> Self {
        Self { tree }
    }

    pub fn get(&self, id: &str) -> Result<Option<Ad>, StoreError> {
        match self.tree.get(id.as_bytes())? {
            Some(raw) => Ok(Some(minicbor::decode(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn insert(&self, ad: &Ad) -> Result<(), StoreError> {
        self.tree.insert(ad.id.as_bytes(), minicbor::to_vec(ad)?)?;
        Ok(())
    }

    pub fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.tree.remove(id.as_bytes())?;
        Ok(())
    }

    /// Full scan with in-memory filtering. Fine at this scale; the tree
    /// holds one record per listed ad.
    pub fn query(&self, filter: &AdFilter) -> Result<Vec<Ad>, StoreError> {
        let mut ads = Vec::new();
        for entry in self.tree.iter() {
            let (_, raw) = entry?;
            let ad: Ad = minicbor::decode(&raw)?;
            if filter.matches(&ad) {
                ads.push(ad);
            }
        }
        filter.sort(&mut ads);
        Ok(ads)
    }
}

/// Persistence for [`ExchangeProposal`] records, keyed by proposal id.
pub struct ProposalStore {
    pub(crate) tree: Tree,
}

impl ProposalStore {
    pub(crate) fn new(tree: Tree) -> Self {
        Self { tree }
    }

    pub fn get(&self, id: &str) -> Result<Option<ExchangeProposal>, StoreError> {
        match self.tree.get(id.as_bytes())? {
            Some(raw) => Ok(Some(minicbor::decode(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn insert(&self, proposal: &ExchangeProposal) -> Result<(), StoreError> {
        self.tree
            .insert(proposal.id.as_bytes(), minicbor::to_vec(proposal)?)?;
        Ok(())
    }

    pub fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.tree.remove(id.as_bytes())?;
        Ok(())
    }

    /// Returns the proposals satisfying `pred`, newest first.
    pub fn query<F>(&self, pred: F) -> Result<Vec<ExchangeProposal>, StoreError>
    where
        F: Fn(&ExchangeProposal) -> bool,
    {
        let mut proposals = Vec::new();
        for entry in self.tree.iter() {
            let (_, raw) = entry?;
            let proposal: ExchangeProposal = minicbor::decode(&raw)?;
            if pred(&proposal) {
                proposals.push(proposal);
            }
        }
        proposals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(proposals)
    }
}

/// Persistence for [`User`] records, keyed by username. The key choice
/// doubles as the uniqueness check for registration.
pub struct UserStore {
    pub(crate) tree: Tree,
}

impl UserStore {
    pub(crate) fn new(tree: Tree) -> Self {
        Self { tree }
    }

    pub fn get(&self, username: &str) -> Result<Option<User>, StoreError> {
        match self.tree.get(username.as_bytes())? {
            Some(raw) => Ok(Some(minicbor::decode(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn insert(&self, user: &User) -> Result<(), StoreError> {
        self.tree
            .insert(user.username.as_bytes(), minicbor::to_vec(user)?)?;
        Ok(())
    }

    /// Inserts only if the username is still free. Returns false when it
    /// is already taken, including when a concurrent insert won the race.
    pub fn insert_new(&self, user: &User) -> Result<bool, StoreError> {
        let swapped = self
            .tree
            .compare_and_swap(
                user.username.as_bytes(),
                None::<&[u8]>,
                Some(minicbor::to_vec(user)?),
            )?
            .is_ok();
        Ok(swapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad::AdDraft;

    fn ad(owner: &str, title: &str, desc: &str, category: Category, condition: Condition) -> Ad {
        AdDraft::new()
            .set_title(title)
            .set_description(desc)
            .set_category(category)
            .set_condition(condition)
            .build(owner)
            .unwrap()
    }

    #[test]
    fn filter_matches_substring_case_insensitive() {
        let desk = ad("user_a", "Wooden Desk", "sturdy oak", Category::Furniture, Condition::Used);

        assert!(AdFilter::new().search("desk").matches(&desk));
        assert!(AdFilter::new().search("OAK").matches(&desk));
        assert!(!AdFilter::new().search("lamp").matches(&desk));
    }

    #[test]
    fn filter_requires_every_criterion() {
        let desk = ad("user_a", "Desk", "", Category::Furniture, Condition::Used);

        let filter = AdFilter::new()
            .search("desk")
            .category(Category::Furniture)
            .condition(Condition::New);
        assert!(!filter.matches(&desk));

        let filter = AdFilter::new()
            .search("desk")
            .category(Category::Furniture)
            .condition(Condition::Used)
            .owner("user_a");
        assert!(filter.matches(&desk));
    }

    #[test]
    fn empty_filter_matches_anything() {
        let desk = ad("user_a", "Desk", "", Category::Furniture, Condition::Used);
        assert!(AdFilter::new().matches(&desk));
    }

    #[test]
    fn sort_orders_by_title() {
        let mut ads = vec![
            ad("user_a", "Lamp", "", Category::Electronics, Condition::New),
            ad("user_a", "Desk", "", Category::Furniture, Condition::Used),
        ];
        AdFilter::new().ordering(AdOrdering::TitleAsc).sort(&mut ads);
        assert_eq!(ads[0].title, "Desk");

        AdFilter::new().ordering(AdOrdering::TitleDesc).sort(&mut ads);
        assert_eq!(ads[0].title, "Lamp");
    }
}
