//! Minimal user record for ownership and registration
//!
//! Authentication, sessions and tokens are handled outside this crate;
//! only the identity record lives here.
use super::ad::TimeStamp;
use super::utils;
use chrono::Utc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Eq, PartialEq, Clone)]
pub struct User {
    #[n(0)]
    pub id: String, // bech32 encoded uuid7, `user_` prefix
    #[n(1)]
    pub username: String,
    #[n(2)]
    pub created_at: TimeStamp<Utc>,
}

impl User {
    pub fn new(username: &str) -> Self {
        Self {
            id: utils::mint_id(utils::USER_HRP),
            username: username.to_string(),
            created_at: TimeStamp::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_gets_prefixed_id() {
        let user = User::new("alice");

        assert!(user.id.starts_with("user_1"));
        assert_eq!(user.username, "alice");
    }
}
