//! Rewording of heuristic offers by a chat model.
//!
//! Polishing never touches prices or probabilities. A polished message is
//! only accepted when it still names the offer's target price and quotes
//! nothing above the listing price.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use whispercart_core::domain::offer::{OfferSet, OfferSource, Strategy};
use whispercart_core::domain::product::ProductListing;

use crate::llm::{extract_json_object, RemoteModelError};

const MAX_MESSAGE_CHARS: usize = 280;

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("static pattern must compile"));

pub fn polish_prompt(listing: &ProductListing, offers: &OfferSet) -> String {
    let current: serde_json::Map<String, Value> = offers
        .iter()
        .map(|offer| (offer.strategy.as_str().to_string(), Value::String(offer.message.clone())))
        .collect();
    let current = serde_json::to_string_pretty(&current).unwrap_or_default();

    format!(
        "Make these negotiation offers sound more natural and persuasive for an Indian \
         e-commerce seller. Keep them brief (1 line max). Product: {}\n\n\
         Current offers:\n{current}\n\n\
         Return improved versions that are friendly, genuine, and likely to get a yes. \
         Keep every price exactly as written. Answer with a JSON object using the same keys.",
        listing.display_name()
    )
}

/// Builds a new offer set from the model's rewrites. `offers` is left as is;
/// the caller keeps it when this returns an error.
pub fn apply_polish(
    listing: &ProductListing,
    offers: &OfferSet,
    raw: &str,
) -> Result<OfferSet, RemoteModelError> {
    let object = extract_json_object(raw)?;
    let rewrites: serde_json::Map<String, Value> = serde_json::from_str(object)
        .map_err(|error| RemoteModelError::MalformedResponse(error.to_string()))?;

    let mut polished = offers.clone();
    let mut accepted = 0_usize;

    for (key, value) in &rewrites {
        let Ok(strategy) = key.parse::<Strategy>() else {
            continue;
        };
        let Some(message) = value.as_str().map(str::trim) else {
            continue;
        };
        let Some(offer) = polished.get_mut(strategy) else {
            continue;
        };
        if !acceptable(message, offer.target_price, listing.price) {
            continue;
        }
        offer.message = message.to_string();
        accepted += 1;
    }

    if accepted == 0 {
        return Err(RemoteModelError::MalformedResponse("no usable rewrites".to_string()));
    }
    polished.source = OfferSource::Polished;
    Ok(polished)
}

/// Bundle targets exceed the unit price, so the ceiling is whichever of
/// price and target is higher.
fn acceptable(message: &str, target: Option<Decimal>, price: Option<Decimal>) -> bool {
    if message.is_empty() || message.chars().count() > MAX_MESSAGE_CHARS {
        return false;
    }

    let amounts = amounts(message);
    if let Some(target) = target {
        if !amounts.contains(&target) {
            return false;
        }
    }
    let ceiling = match (price, target) {
        (Some(price), Some(target)) => Some(price.max(target)),
        (price, target) => price.or(target),
    };
    ceiling.map_or(true, |ceiling| amounts.iter().all(|amount| *amount <= ceiling))
}

fn amounts(message: &str) -> Vec<Decimal> {
    AMOUNT
        .find_iter(message)
        .filter_map(|found| found.as_str().replace(',', "").parse().ok())
        .collect()
}
