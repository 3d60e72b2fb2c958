use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Strategy {
    #[serde(rename = "aggressive")]
    Aggressive,
    #[default]
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "friendly")]
    Friendly,
    #[serde(rename = "bundle", alias = "bundleOffer")]
    Bundle,
    #[serde(rename = "reviewBased")]
    ReviewBased,
}

impl Strategy {
    /// Enumeration order, also the tie-break order for rankings.
    pub const ALL: [Strategy; 5] =
        [Self::Aggressive, Self::Moderate, Self::Friendly, Self::Bundle, Self::ReviewBased];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aggressive => "aggressive",
            Self::Moderate => "moderate",
            Self::Friendly => "friendly",
            Self::Bundle => "bundle",
            Self::ReviewBased => "reviewBased",
        }
    }

    /// Unknown or missing names resolve to [`Strategy::Moderate`].
    pub fn resolve(name: Option<&str>) -> Self {
        name.and_then(|value| value.parse().ok()).unwrap_or(Self::Moderate)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "aggressive" => Ok(Self::Aggressive),
            "moderate" => Ok(Self::Moderate),
            "friendly" => Ok(Self::Friendly),
            "bundle" | "bundleOffer" => Ok(Self::Bundle),
            "reviewBased" | "review_based" => Ok(Self::ReviewBased),
            other => Err(DomainError::InvariantViolation(format!("unknown strategy `{other}`"))),
        }
    }
}

/// Qualitative estimate of seller acceptance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Probability {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl Probability {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub strategy: Strategy,
    pub offer: String,
    pub reasoning: String,
    pub probability: Probability,
    pub message: String,
    pub why_it_works: String,
    /// Price named in the ask. `None` for open-ended asks. For bundles this
    /// is the total for both units.
    pub target_price: Option<Decimal>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferSource {
    #[default]
    Heuristic,
    Polished,
    Fallback,
}

/// The five strategy offers for one listing.
///
/// The fallback set only carries aggressive, moderate and friendly, so
/// `bundle` and `review_based` are optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferSet {
    pub aggressive: Offer,
    pub moderate: Offer,
    pub friendly: Offer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<Offer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_based: Option<Offer>,
    #[serde(default)]
    pub source: OfferSource,
}

impl OfferSet {
    pub fn get(&self, strategy: Strategy) -> Option<&Offer> {
        match strategy {
            Strategy::Aggressive => Some(&self.aggressive),
            Strategy::Moderate => Some(&self.moderate),
            Strategy::Friendly => Some(&self.friendly),
            Strategy::Bundle => self.bundle.as_ref(),
            Strategy::ReviewBased => self.review_based.as_ref(),
        }
    }

    pub fn get_mut(&mut self, strategy: Strategy) -> Option<&mut Offer> {
        match strategy {
            Strategy::Aggressive => Some(&mut self.aggressive),
            Strategy::Moderate => Some(&mut self.moderate),
            Strategy::Friendly => Some(&mut self.friendly),
            Strategy::Bundle => self.bundle.as_mut(),
            Strategy::ReviewBased => self.review_based.as_mut(),
        }
    }

    /// The offer for `strategy`, or moderate when that offer is absent.
    pub fn select(&self, strategy: Strategy) -> &Offer {
        self.get(strategy).unwrap_or(&self.moderate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Offer> {
        Strategy::ALL.into_iter().filter_map(move |strategy| self.get(strategy))
    }

    pub fn is_fallback(&self) -> bool {
        self.source == OfferSource::Fallback
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySummary {
    pub name: Strategy,
    pub offer: String,
    pub probability: Probability,
    pub why_it_works: String,
}

impl From<&Offer> for StrategySummary {
    fn from(offer: &Offer) -> Self {
        Self {
            name: offer.strategy,
            offer: offer.offer.clone(),
            probability: offer.probability,
            why_it_works: offer.why_it_works.clone(),
        }
    }
}
