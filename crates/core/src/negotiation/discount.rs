//! Discount-potential heuristic used by every priced strategy.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upper bound on any heuristic discount, in percent.
pub const MAX_DISCOUNT_PCT: u8 = 30;

/// How confident a seller is likely to be, read off the listing rating.
///
/// Confident sellers leave less room, so each tier carries a minimum
/// discount that only ever raises the potential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellerConfidence {
    Strong,
    Solid,
    Fair,
    Weak,
}

impl SellerConfidence {
    /// Missing or unparseable ratings count as [`SellerConfidence::Weak`].
    pub fn from_rating(rating: Option<f64>) -> Self {
        match rating {
            Some(value) if value >= 4.5 => Self::Strong,
            Some(value) if value >= 4.0 => Self::Solid,
            Some(value) if value >= 3.5 => Self::Fair,
            _ => Self::Weak,
        }
    }

    pub fn floor_pct(self) -> u8 {
        match self {
            Self::Strong => 5,
            Self::Solid => 10,
            Self::Fair => 15,
            Self::Weak => 20,
        }
    }
}

/// Percentage a seller might reasonably concede, in `0..=30`.
///
/// Seeds from the markdown against `original_price` when that is higher
/// than `price`, raises to the rating tier floor, then clamps.
pub fn discount_potential(
    price: Decimal,
    original_price: Option<Decimal>,
    rating: Option<f64>,
) -> u8 {
    let markdown = original_price
        .filter(|original| *original > price && *original > Decimal::ZERO)
        .map(|original| markdown_pct(price, original))
        .unwrap_or(0);

    markdown.max(SellerConfidence::from_rating(rating).floor_pct()).min(MAX_DISCOUNT_PCT)
}

fn markdown_pct(price: Decimal, original: Decimal) -> u8 {
    (original - price)
        .checked_div(original)
        .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| pct.floor().to_u8())
        .unwrap_or(u8::MAX)
}

/// `floor(price * (1 - pct/100))`, never below zero.
///
/// `None` when the product leaves `Decimal`'s range.
pub fn apply_discount(price: Decimal, pct: u8) -> Option<Decimal> {
    let keep = Decimal::ONE_HUNDRED - Decimal::from(pct.min(100));
    let kept = price.checked_mul(keep)?.checked_div(Decimal::ONE_HUNDRED)?;
    Some(kept.floor().max(Decimal::ZERO))
}

/// Moderate asks use sixty percent of the potential, rounded down.
pub fn moderate_pct(potential: u8) -> u8 {
    ((u16::from(potential) * 6) / 10) as u8
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{apply_discount, discount_potential, moderate_pct, SellerConfidence};

    fn rupees(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    #[test]
    fn rating_tiers_set_minimum_potential() {
        assert_eq!(discount_potential(rupees(1000), None, Some(4.7)), 5);
        assert_eq!(discount_potential(rupees(1000), None, Some(4.2)), 10);
        assert_eq!(discount_potential(rupees(1000), None, Some(3.6)), 15);
        assert_eq!(discount_potential(rupees(1000), None, Some(2.0)), 20);
        assert_eq!(discount_potential(rupees(1000), None, None), 20);
    }

    #[test]
    fn markdown_seeds_potential_above_the_floor() {
        // 25% markdown beats the 5% floor of a 4.6 rating.
        assert_eq!(discount_potential(rupees(750), Some(rupees(1000)), Some(4.6)), 25);
        // 8% markdown is raised to the 10% floor.
        assert_eq!(discount_potential(rupees(920), Some(rupees(1000)), Some(4.1)), 10);
    }

    #[test]
    fn potential_is_capped_at_thirty_percent() {
        assert_eq!(discount_potential(rupees(100), Some(rupees(1000)), Some(4.9)), 30);
        assert_eq!(discount_potential(rupees(0), Some(rupees(1000)), None), 30);
    }

    #[test]
    fn original_price_below_current_is_ignored() {
        assert_eq!(discount_potential(rupees(1200), Some(rupees(1000)), Some(4.8)), 5);
        assert_eq!(discount_potential(rupees(1200), Some(Decimal::ZERO), Some(4.8)), 5);
    }

    #[test]
    fn potential_stays_in_bounds_across_inputs() {
        let prices = [0, 1, 99, 1_000, 59_999];
        let originals = [None, Some(0), Some(50), Some(1_000), Some(120_000)];
        let ratings = [None, Some(0.0), Some(3.49), Some(3.5), Some(4.0), Some(4.5), Some(5.0)];

        for price in prices {
            for original in originals {
                for rating in ratings {
                    let potential =
                        discount_potential(rupees(price), original.map(rupees), rating);
                    assert!(potential <= 30, "{price} {original:?} {rating:?} -> {potential}");
                }
            }
        }
    }

    #[test]
    fn apply_discount_floors_to_whole_rupees() {
        assert_eq!(apply_discount(rupees(1000), 5), Some(rupees(950)));
        assert_eq!(apply_discount(Decimal::new(99999, 2), 10), Some(rupees(899)));
        assert_eq!(apply_discount(rupees(7), 30), Some(rupees(4)));
        assert_eq!(apply_discount(rupees(0), 30), Some(rupees(0)));
    }

    #[test]
    fn apply_discount_reports_overflow_instead_of_panicking() {
        assert_eq!(apply_discount(Decimal::MAX, 10), None);
        assert_eq!(apply_discount(Decimal::MAX, 100), Some(Decimal::ZERO));
    }

    #[test]
    fn huge_markdown_inputs_stay_capped() {
        assert_eq!(discount_potential(Decimal::ONE, Some(Decimal::MAX), Some(4.9)), 30);
    }

    #[test]
    fn moderate_share_rounds_down() {
        assert_eq!(moderate_pct(5), 3);
        assert_eq!(moderate_pct(20), 12);
        assert_eq!(moderate_pct(29), 17);
    }

    #[test]
    fn unknown_rating_is_weak_confidence() {
        assert_eq!(SellerConfidence::from_rating(Some(f64::NAN)), SellerConfidence::Weak);
        assert_eq!(SellerConfidence::from_rating(None).floor_pct(), 20);
    }
}
