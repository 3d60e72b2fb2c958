use whispercart_core::negotiation::{DeterministicOfferGenerator, NegotiationPlan, OfferGenerator};

use crate::commands::{validated_listing, CommandResult, ProductArgs};

pub fn run(product: &ProductArgs, strategy: Option<&str>) -> CommandResult {
    let listing = match validated_listing("offers", product) {
        Ok(listing) => listing,
        Err(result) => return result,
    };

    let plan = NegotiationPlan::new(DeterministicOfferGenerator.generate(&listing), strategy);
    let message = format!(
        "{} offers generated for {}",
        plan.strategies.len(),
        listing.display_name()
    );
    CommandResult::with_data("offers", message, &plan)
}
