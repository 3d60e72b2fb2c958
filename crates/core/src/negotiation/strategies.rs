use rust_decimal::Decimal;

use crate::domain::offer::{Offer, OfferSet, OfferSource, Probability, Strategy};
use crate::errors::DomainError;
use crate::negotiation::discount::{apply_discount, moderate_pct};

const BUNDLE_UNITS: i64 = 2;
const FALLBACK_AGGRESSIVE_PCT: u8 = 30;
const FALLBACK_MODERATE_PCT: u8 = 15;

pub(crate) fn rupees(amount: Decimal) -> String {
    format!("₹{}", amount.normalize())
}

fn discounted(price: Decimal, pct: u8) -> Result<Decimal, DomainError> {
    apply_discount(price, pct).ok_or_else(|| out_of_range(price))
}

fn out_of_range(price: Decimal) -> DomainError {
    DomainError::InvariantViolation(format!("price {price} is too large to negotiate on"))
}

pub fn aggressive_offer(price: Decimal, potential: u8) -> Result<Offer, DomainError> {
    let target = discounted(price, potential)?;
    let saving = price - target;

    Ok(Offer {
        strategy: Strategy::Aggressive,
        offer: format!("Can you do {}?", rupees(target)),
        reasoning: format!("Direct price reduction of {}", rupees(saving)),
        probability: if potential > 15 { Probability::Medium } else { Probability::Low },
        message: format!(
            "I'm interested but can you offer this for {}? I'll buy immediately.",
            rupees(target)
        ),
        why_it_works: "Direct and clear, shows serious intent".to_string(),
        target_price: Some(target),
    })
}

pub fn moderate_offer(price: Decimal, potential: u8) -> Result<Offer, DomainError> {
    let pct = moderate_pct(potential);
    let target = discounted(price, pct)?;
    let saving = price - target;

    Ok(Offer {
        strategy: Strategy::Moderate,
        offer: format!("Is {} possible?", rupees(target)),
        reasoning: format!("Realistic discount of {} (~{pct}%)", rupees(saving)),
        probability: Probability::High,
        message: format!(
            "This looks good! Would you be able to offer this at {}? I'm ready to purchase.",
            rupees(target)
        ),
        why_it_works: "Reasonable, shows you did research".to_string(),
        target_price: Some(target),
    })
}

pub fn friendly_offer() -> Offer {
    Offer {
        strategy: Strategy::Friendly,
        offer: "Best price you can offer?".to_string(),
        reasoning: "Opens dialogue, builds relationship".to_string(),
        probability: Probability::VeryHigh,
        message: "Hi! I really like this product. What's the best price you can offer me right now? I'm ready to buy."
            .to_string(),
        why_it_works: "Friendly, non-aggressive, invites dialogue".to_string(),
        target_price: None,
    }
}

/// Two units for 1.8x the unit price, independent of the discount heuristic.
pub fn bundle_offer(price: Decimal) -> Result<Offer, DomainError> {
    let total =
        price.checked_mul(Decimal::new(18, 1)).ok_or_else(|| out_of_range(price))?.floor();
    let each = (total / Decimal::from(BUNDLE_UNITS)).floor();

    Ok(Offer {
        strategy: Strategy::Bundle,
        offer: format!("Buy {BUNDLE_UNITS} for {}?", rupees(total)),
        reasoning: "Higher volume = better margin for seller".to_string(),
        probability: Probability::High,
        message: format!(
            "If I buy {BUNDLE_UNITS} of these, can you do both for {}? ({} each)",
            rupees(total),
            rupees(each)
        ),
        why_it_works: "Sellers love volume, win-win deal".to_string(),
        target_price: Some(total),
    })
}

pub fn review_based_offer(
    price: Decimal,
    rating: Option<f64>,
    reviews: Option<u32>,
) -> Result<Offer, DomainError> {
    let review_count = reviews.unwrap_or(0);
    let low_rated = rating.is_some_and(|value| value < 3.5);
    let average_rated = rating.is_some_and(|value| value < 4.0);
    let rating_label = rating.map(|value| value.to_string()).unwrap_or_else(|| "?".to_string());

    let (target, offer, reasoning) = if low_rated && review_count > 100 {
        let target = discounted(price, 25)?;
        (
            target,
            format!("Can you do {} given the mixed reviews?", rupees(target)),
            format!("Low rating ({rating_label}/5) on {review_count} reviews = buyer risk"),
        )
    } else if average_rated && review_count > 50 {
        let target = discounted(price, 20)?;
        (
            target,
            format!("{} considering the reviews?", rupees(target)),
            format!("Average rating ({rating_label}/5) = less buyer confidence"),
        )
    } else {
        let target = discounted(price, 15)?;
        (
            target,
            format!("Any room on the price? Would {} work for you?", rupees(target)),
            "Neutral: polite, doesn't blame seller".to_string(),
        )
    };

    Ok(Offer {
        strategy: Strategy::ReviewBased,
        message: offer.clone(),
        offer,
        reasoning,
        probability: if low_rated { Probability::High } else { Probability::Medium },
        why_it_works: "Factual, shows you read reviews, legitimate concern".to_string(),
        target_price: Some(target),
    })
}

/// Aggressive, moderate and friendly asks at 30%, 15% and 0% off.
///
/// Without a usable price the asks name the percentage instead of an amount.
/// Prices too large to discount are treated the same way.
pub fn fallback_offers(price: Option<Decimal>) -> OfferSet {
    let targets = price.filter(|value| *value >= Decimal::ZERO).and_then(|price| {
        Some((
            apply_discount(price, FALLBACK_AGGRESSIVE_PCT)?,
            apply_discount(price, FALLBACK_MODERATE_PCT)?,
        ))
    });
    let ask = |pct: u8, target: Option<Decimal>| match target {
        Some(target) => (rupees(target), Some(target)),
        None => (format!("{pct}% off"), None),
    };

    let (low_label, low_target) = ask(FALLBACK_AGGRESSIVE_PCT, targets.map(|(low, _)| low));
    let (mid_label, mid_target) = ask(FALLBACK_MODERATE_PCT, targets.map(|(_, mid)| mid));

    OfferSet {
        aggressive: Offer {
            strategy: Strategy::Aggressive,
            offer: format!("Can you do {low_label}?"),
            reasoning: format!("Opening ask at {FALLBACK_AGGRESSIVE_PCT}% off"),
            probability: Probability::Low,
            message: format!("Can you offer this at {low_label}?"),
            why_it_works: "Anchors the conversation low".to_string(),
            target_price: low_target,
        },
        moderate: Offer {
            strategy: Strategy::Moderate,
            offer: format!("Is {mid_label} possible?"),
            reasoning: format!("Middle-ground ask at {FALLBACK_MODERATE_PCT}% off"),
            probability: Probability::High,
            message: format!("Would {mid_label} work for you?"),
            why_it_works: "Reasonable and easy to accept".to_string(),
            target_price: mid_target,
        },
        friendly: Offer {
            strategy: Strategy::Friendly,
            offer: "Best price available?".to_string(),
            reasoning: "Opens dialogue without naming a number".to_string(),
            probability: Probability::VeryHigh,
            message: "Hi! What's your best price for this item?".to_string(),
            why_it_works: "Friendly, non-aggressive, invites dialogue".to_string(),
            target_price: None,
        },
        bundle: None,
        review_based: None,
        source: OfferSource::Fallback,
    }
}
