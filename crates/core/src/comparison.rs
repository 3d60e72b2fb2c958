//! Side-by-side comparison of two or three listings.

use std::fmt::Write as _;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductListing;
use crate::errors::DomainError;
use crate::negotiation::strategies::rupees;

pub const MIN_PRODUCTS: usize = 2;
pub const MAX_PRODUCTS: usize = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductComparison {
    pub analysis: String,
    pub products: Vec<ProductListing>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueLabel {
    Excellent,
    Good,
    Fair,
}

impl ValueLabel {
    /// Rating points per thousand rupees: above 4 is excellent, above 2 good.
    pub fn assess(price: Decimal, rating: Option<f64>) -> Self {
        let rating = rating.unwrap_or(0.0);
        let thousands = price.to_f64().unwrap_or(0.0) / 1000.0;
        let value = rating / thousands;

        if value > 4.0 {
            Self::Excellent
        } else if value > 2.0 {
            Self::Good
        } else {
            Self::Fair
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }
}

pub fn validate(products: &[ProductListing]) -> Result<(), DomainError> {
    if products.len() < MIN_PRODUCTS {
        return Err(DomainError::InvalidComparison(
            "Please provide at least 2 products to compare.".to_string(),
        ));
    }
    if products.len() > MAX_PRODUCTS {
        return Err(DomainError::InvalidComparison(
            "Maximum 3 products can be compared at once.".to_string(),
        ));
    }
    for product in products {
        product.require_price()?;
    }
    Ok(())
}

/// Prompt sent to the remote model before falling back to [`compare_locally`].
pub fn comparison_prompt(products: &[ProductListing]) -> String {
    let summaries: Vec<String> = products
        .iter()
        .enumerate()
        .map(|(index, product)| {
            format!(
                "Product {}: {}\n- Price: {}\n- Rating: {}/5 ({} reviews)\n- Store: {}",
                index + 1,
                product.display_name(),
                product.price.map(rupees).unwrap_or_else(|| "unknown".to_string()),
                rating_label(product.rating),
                product.reviews.unwrap_or(0),
                product.store.as_deref().unwrap_or("Amazon"),
            )
        })
        .collect();

    format!(
        "Compare these products and provide a concise analysis:\n\n{}\n\nProvide:\n\
         1. Key Differences (specs, features, quality)\n\
         2. Price-to-Value Analysis\n\
         3. Pros and Cons for each\n\
         4. Recommendation (which to buy and why)\n\n\
         Keep it concise and actionable.",
        summaries.join("\n\n")
    )
}

struct Priced<'a> {
    listing: &'a ProductListing,
    price: Decimal,
}

pub fn compare_locally(products: &[ProductListing]) -> Result<ProductComparison, DomainError> {
    validate(products)?;

    let priced = products
        .iter()
        .map(|listing| listing.require_price().map(|price| Priced { listing, price }))
        .collect::<Result<Vec<_>, _>>()?;

    // `validate` guarantees at least two entries.
    let first = &priced[0];
    let mut cheapest = first;
    let mut most_expensive = first;
    let mut highest_rated = first;
    for candidate in &priced[1..] {
        if candidate.price < cheapest.price {
            cheapest = candidate;
        }
        if candidate.price >= most_expensive.price {
            most_expensive = candidate;
        }
        if candidate.listing.rating.unwrap_or(0.0) > highest_rated.listing.rating.unwrap_or(0.0) {
            highest_rated = candidate;
        }
    }

    let stores: Vec<&str> =
        products.iter().map(|product| product.store.as_deref().unwrap_or("unknown")).collect();

    let mut analysis = String::from("**Smart Comparison Analysis**\n\n**Key Differences:**\n");
    let _ = writeln!(
        analysis,
        "- Price Range: {} to {}",
        rupees(cheapest.price),
        rupees(most_expensive.price)
    );
    let _ = writeln!(
        analysis,
        "- Highest Rated: {} ({}/5)",
        highest_rated.listing.display_name(),
        rating_label(highest_rated.listing.rating)
    );
    let _ = writeln!(analysis, "- Stores: {}", stores.join(", "));

    analysis.push_str("\n**Price-to-Value:**\n");
    for (index, item) in priced.iter().enumerate() {
        let label = ValueLabel::assess(item.price, item.listing.rating);
        let _ = writeln!(
            analysis,
            "{}. {}: {} value",
            index + 1,
            item.listing.display_name(),
            label.as_str()
        );
    }

    analysis.push_str("\n**Pros & Cons:**\n");
    for (index, item) in priced.iter().enumerate() {
        let praise = if item.listing.rating.unwrap_or(0.0) >= 4.5 {
            "Highly rated by customers"
        } else {
            "Decent customer reviews"
        };
        let positioning =
            if item.price == cheapest.price { "Most affordable option" } else { "Premium quality" };
        let drawback = if item.price == most_expensive.price {
            "Higher price point"
        } else {
            "May have fewer features"
        };
        let _ = writeln!(
            analysis,
            "Product {} ({}):\n+ {praise}\n+ {positioning}\n- {drawback}",
            index + 1,
            item.listing.display_name()
        );
    }

    analysis.push_str("\n**Recommendation:**\n");
    if highest_rated.price == cheapest.price {
        let _ = write!(
            analysis,
            "Go with {} - it's both the cheapest AND highest rated. Best value!",
            highest_rated.listing.display_name()
        );
    } else {
        let _ = write!(
            analysis,
            "If budget allows, choose {} for best quality. For savings, {} is solid.",
            highest_rated.listing.display_name(),
            cheapest.listing.display_name()
        );
    }

    Ok(ProductComparison { analysis, products: products.to_vec() })
}

fn rating_label(rating: Option<f64>) -> String {
    rating.map(|value| value.to_string()).unwrap_or_else(|| "?".to_string())
}
