use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::offer::{Offer, OfferSet, OfferSource, Strategy, StrategySummary};
use crate::domain::product::ProductListing;
use crate::errors::DomainError;
use crate::negotiation::discount::discount_potential;
use crate::negotiation::strategies::{
    aggressive_offer, bundle_offer, fallback_offers, friendly_offer, moderate_offer,
    review_based_offer,
};

pub trait OfferGenerator: Send + Sync {
    /// Never fails: listings the heuristic cannot price get the fallback set.
    fn generate(&self, listing: &ProductListing) -> OfferSet;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicOfferGenerator;

impl OfferGenerator for DeterministicOfferGenerator {
    fn generate(&self, listing: &ProductListing) -> OfferSet {
        match try_generate(listing) {
            Ok(offers) => offers,
            Err(error) => {
                warn!(
                    event_name = "core.negotiation.offers_fallback",
                    product_id = listing.product_id().as_str(),
                    error = %error,
                    "offer heuristic failed, returning fallback offers"
                );
                fallback_offers(listing.price)
            }
        }
    }
}

pub fn try_generate(listing: &ProductListing) -> Result<OfferSet, DomainError> {
    let price = listing.require_price()?;
    let potential = discount_potential(price, listing.original_price, listing.rating);

    let offers = OfferSet {
        aggressive: aggressive_offer(price, potential)?,
        moderate: moderate_offer(price, potential)?,
        friendly: friendly_offer(),
        bundle: Some(bundle_offer(price)?),
        review_based: Some(review_based_offer(price, listing.rating, listing.reviews)?),
        source: OfferSource::Heuristic,
    };

    check_targets(&offers, price)?;
    Ok(offers)
}

/// Single-unit targets must sit in `0..=price` and aggressive may not ask
/// for less of a discount than moderate.
pub fn check_targets(offers: &OfferSet, price: Decimal) -> Result<(), DomainError> {
    for offer in offers.iter().filter(|offer| offer.strategy != Strategy::Bundle) {
        if let Some(target) = offer.target_price {
            if target < Decimal::ZERO || target > price {
                return Err(DomainError::InvariantViolation(format!(
                    "{} target {target} outside 0..={price}",
                    offer.strategy
                )));
            }
        }
    }

    match (offers.aggressive.target_price, offers.moderate.target_price) {
        (Some(aggressive), Some(moderate)) if aggressive > moderate => {
            Err(DomainError::InvariantViolation(format!(
                "aggressive target {aggressive} above moderate target {moderate}"
            )))
        }
        _ => Ok(()),
    }
}

/// Offers plus the one to lead with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationPlan {
    pub offers: OfferSet,
    pub recommended: Offer,
    pub strategies: Vec<StrategySummary>,
}

impl NegotiationPlan {
    pub fn new(offers: OfferSet, preferred: Option<&str>) -> Self {
        let recommended = offers.select(Strategy::resolve(preferred)).clone();
        let strategies = offers.iter().map(StrategySummary::from).collect();
        Self { offers, recommended, strategies }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{try_generate, DeterministicOfferGenerator, NegotiationPlan, OfferGenerator};
    use crate::domain::offer::{OfferSource, Strategy};
    use crate::domain::product::ProductListing;

    fn listing(price: i64) -> ProductListing {
        ProductListing::new("Wireless Earbuds", Decimal::new(price, 0))
    }

    #[test]
    fn generates_all_five_strategies() {
        let mut product = listing(2999);
        product.original_price = Some(Decimal::new(3999, 0));
        product.rating = Some(4.2);
        product.reviews = Some(1200);

        let offers = DeterministicOfferGenerator.generate(&product);

        assert_eq!(offers.source, OfferSource::Heuristic);
        assert_eq!(offers.iter().count(), 5);
        // 25% markdown: aggressive 2249, moderate 15% -> 2549.
        assert_eq!(offers.aggressive.target_price, Some(Decimal::new(2249, 0)));
        assert_eq!(offers.moderate.target_price, Some(Decimal::new(2549, 0)));
        assert_eq!(offers.bundle.as_ref().and_then(|o| o.target_price), Some(Decimal::new(5398, 0)));
    }

    #[test]
    fn aggressive_never_asks_for_less_than_moderate() {
        for price in [1, 9, 99, 499, 2_000, 74_999] {
            for rating in [None, Some(2.5), Some(3.7), Some(4.3), Some(4.9)] {
                let mut product = listing(price);
                product.rating = rating;
                let offers = try_generate(&product).expect("priced listing");

                let aggressive = offers.aggressive.target_price.expect("aggressive target");
                let moderate = offers.moderate.target_price.expect("moderate target");
                assert!(aggressive <= moderate, "{price} {rating:?}");
                assert!(moderate < Decimal::new(price, 0), "{price} {rating:?}");
            }
        }
    }

    #[test]
    fn missing_price_falls_back_without_failing() {
        let product = ProductListing { title: Some("Mystery Box".to_string()), ..Default::default() };

        assert!(try_generate(&product).is_err());

        let offers = DeterministicOfferGenerator.generate(&product);
        assert!(offers.is_fallback());
        assert!(offers.bundle.is_none());
        assert!(offers.review_based.is_none());
    }

    #[test]
    fn negative_price_falls_back() {
        let offers = DeterministicOfferGenerator.generate(&listing(-10));
        assert!(offers.is_fallback());
        assert!(offers.aggressive.target_price.is_none());
    }

    #[test]
    fn oversized_price_degrades_to_fallback_without_panicking() {
        let yacht = ProductListing::new(
            "Yacht",
            "1000000000000000000000000000".parse::<Decimal>().expect("decimal"),
        );
        assert!(try_generate(&yacht).is_err());

        let offers = DeterministicOfferGenerator.generate(&yacht);
        assert!(offers.is_fallback());
        assert!(offers.moderate.target_price.is_none());
        assert_eq!(offers.moderate.offer, "Is 15% off possible?");

        let ceiling =
            DeterministicOfferGenerator.generate(&ProductListing::new("Max", Decimal::MAX));
        assert!(ceiling.is_fallback());
        assert!(ceiling.aggressive.target_price.is_none());
    }

    #[test]
    fn plan_recommends_preferred_strategy_or_moderate() {
        let offers = DeterministicOfferGenerator.generate(&listing(1000));

        let plan = NegotiationPlan::new(offers.clone(), Some("friendly"));
        assert_eq!(plan.recommended.strategy, Strategy::Friendly);
        assert_eq!(plan.strategies.len(), 5);
        assert_eq!(plan.strategies[0].name, Strategy::Aggressive);

        let plan = NegotiationPlan::new(offers, Some("haggle"));
        assert_eq!(plan.recommended.strategy, Strategy::Moderate);

        let fallback = DeterministicOfferGenerator.generate(&ProductListing::default());
        let plan = NegotiationPlan::new(fallback, Some("bundle"));
        assert_eq!(plan.recommended.strategy, Strategy::Moderate);
        assert_eq!(plan.strategies.len(), 3);
    }
}
