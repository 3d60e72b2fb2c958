pub mod compare;
pub mod config;
pub mod doctor;
pub mod intent;
pub mod message;
pub mod offers;

use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use whispercart_core::domain::product::{ProductId, ProductListing};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn with_data(command: &str, message: impl Into<String>, data: &impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(error) => return Self::failure(command, "serialization", error.to_string(), 1),
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Listing flags shared by `offers` and `message`.
#[derive(Debug, Clone, Default, Args)]
pub struct ProductArgs {
    #[arg(long, help = "Listing title")]
    pub title: Option<String>,
    #[arg(long, help = "Current price in rupees")]
    pub price: Decimal,
    #[arg(long = "original-price", help = "List price before the marketplace discount")]
    pub original_price: Option<Decimal>,
    #[arg(long, help = "Average rating out of 5")]
    pub rating: Option<f64>,
    #[arg(long, help = "Number of reviews")]
    pub reviews: Option<u32>,
    #[arg(long, help = "Marketplace product id")]
    pub id: Option<String>,
}

impl ProductArgs {
    pub fn listing(&self) -> ProductListing {
        ProductListing {
            id: self.id.clone().map(ProductId),
            title: self.title.clone(),
            price: Some(self.price),
            original_price: self.original_price,
            rating: self.rating,
            reviews: self.reviews,
            ..ProductListing::default()
        }
    }
}

/// Rejects listings the HTTP layer would also turn away.
fn validated_listing(
    command: &str,
    product: &ProductArgs,
) -> Result<ProductListing, CommandResult> {
    let listing = product.listing();
    listing
        .require_price()
        .map_err(|error| CommandResult::failure(command, "invalid_input", error.to_string(), 2))?;
    Ok(listing)
}
