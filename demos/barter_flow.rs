//! Walkthrough of the full exchange workflow against a local sled db.
use std::sync::Arc;

use barter::ad::{AdDraft, Category, Condition};
use barter::policy::ActionCode;
use barter::proposal::ProposalAction;
use barter::service::BarterService;
use barter::store::AdFilter;

fn main() -> anyhow::Result<()> {
    let db = sled::open("barter_flow.db")?;

    if !db.is_empty() {
        db.clear()?;
    }

    let service = BarterService::new(Arc::new(db))?;

    let alice = service.register_user("alice")?;
    let bob = service.register_user("bob")?;

    let desk = service.create_ad(
        &alice.id,
        AdDraft::new()
            .set_title("Writing desk")
            .set_description("Solid wood, some wear.")
            .set_category(Category::Furniture)
            .set_condition(Condition::Used),
    )?;
    let lamp = service.create_ad(
        &bob.id,
        AdDraft::new()
            .set_title("LED lamp")
            .set_description("Still boxed.")
            .set_category(Category::Electronics)
            .set_condition(Condition::New),
    )?;

    println!("listed ads:");
    for ad in service.list_ads(&AdFilter::new())? {
        println!("  [{}] {} ({}, {})", ad.id, ad.title, ad.category, ad.condition);
    }

    // Bob offers his lamp for Alice's desk.
    let proposal = service.propose_exchange(&bob.id, &desk.id, &lamp.id, "Lamp for the desk?")?;
    println!("proposal {} is {}", proposal.id, proposal.status);

    // Alice, owning the requested desk, decides.
    let outcome = service.handle_proposal(&alice.id, &proposal.id, ProposalAction::Accept);
    println!("{}", ActionCode::from_outcome(&outcome).message());

    let desk = service.get_ad(&desk.id)?;
    let lamp = service.get_ad(&lamp.id)?;
    println!("desk exchanged: {}", desk.is_exchanged);
    println!("lamp exchanged: {}", lamp.is_exchanged);

    // A second decision on the same proposal is refused.
    let again = service.handle_proposal(&alice.id, &proposal.id, ProposalAction::Reject);
    println!("{}", ActionCode::from_outcome(&again).message());

    service.flush()?;
    Ok(())
}
