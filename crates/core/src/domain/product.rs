use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn unknown() -> Self {
        Self("unknown".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A marketplace listing as handed over by the search layer.
///
/// Every field is optional on the wire; callers are expected to validate
/// `price` before asking for offers, but the negotiation engine tolerates
/// its absence and degrades to the fallback offer set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    #[serde(default)]
    pub id: Option<ProductId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default, alias = "reviewCount", alias = "reviewsCount")]
    pub reviews: Option<u32>,
    #[serde(default)]
    pub store: Option<String>,
}

impl ProductListing {
    pub fn new(title: impl Into<String>, price: Decimal) -> Self {
        Self { title: Some(title.into()), price: Some(price), ..Self::default() }
    }

    /// `title` wins over `name`; an unnamed listing renders as "this product".
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or("this product")
    }

    pub fn product_id(&self) -> ProductId {
        self.id.clone().unwrap_or_else(ProductId::unknown)
    }

    pub fn require_price(&self) -> Result<Decimal, DomainError> {
        match self.price {
            Some(price) if price >= Decimal::ZERO => Ok(price),
            Some(price) => {
                Err(DomainError::InvalidListing(format!("price must not be negative, got {price}")))
            }
            None => Err(DomainError::InvalidListing("listing has no price".to_string())),
        }
    }

    pub fn tier(&self) -> ListingTier {
        ListingTier::from_rating(self.rating)
    }
}

/// Qualitative rating bucket shown next to marketplace results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingTier {
    Platinum,
    Gold,
    Silver,
    Standard,
}

impl ListingTier {
    pub fn from_rating(rating: Option<f64>) -> Self {
        match rating {
            Some(value) if value >= 4.5 => Self::Platinum,
            Some(value) if value >= 4.0 => Self::Gold,
            Some(value) if value >= 3.0 => Self::Silver,
            _ => Self::Standard,
        }
    }
}
