//! Utility functions for minting identifiers

use bech32::Bech32m;
use uuid7::uuid7;

/// Prefix for user ids, e.g. `user_1...`
pub const USER_HRP: &str = "user_";
/// Prefix for ad ids, e.g. `ad_1...`
pub const AD_HRP: &str = "ad_";
/// Prefix for exchange proposal ids, e.g. `prop_1...`
pub const PROPOSAL_HRP: &str = "prop_";

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

// id minting for the well-known prefixes above. A 16 byte uuid payload is
// always within the bech32 length limit, so encoding cannot fail here.
pub(crate) fn mint_id(hrp: &str) -> String {
    let hrp = bech32::Hrp::parse_unchecked(hrp);
    bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())
        .expect("failed to serialise uuid payload to bech32 encoding.")
}
