use whispercart_core::negotiation::{
    negotiation_message, DeterministicOfferGenerator, OfferGenerator,
};

use crate::commands::{validated_listing, CommandResult, ProductArgs};

pub fn run(product: &ProductArgs, strategy: Option<&str>) -> CommandResult {
    let listing = match validated_listing("message", product) {
        Ok(listing) => listing,
        Err(result) => return result,
    };

    let offers = DeterministicOfferGenerator.generate(&listing);
    let message = negotiation_message(&listing, &offers, strategy);
    CommandResult::with_data("message", "seller message ready to copy", &message)
}
