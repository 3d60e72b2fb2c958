use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::offer::{OfferSet, Strategy};
use crate::domain::product::{ProductId, ProductListing};
use crate::errors::DomainError;

const SUBJECT_TITLE_CHARS: usize = 50;
pub const SUPPORT_EMAIL: &str = "support@whispercart.com";

pub const NEXT_STEPS: [&str; 5] = [
    "1. Copy the message above",
    "2. Send to seller via chat/DM",
    "3. Wait for response (typically 1-2 hours)",
    "4. If seller agrees, purchase immediately!",
    "5. If not, try our escalation service",
];

/// Seller-facing message built from one strategy's offer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationMessage {
    pub subject: String,
    pub body: String,
    pub follow_up: String,
    pub escalation_text: EscalationOffer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationOffer {
    pub text: String,
    pub action: String,
    pub benefit: String,
    pub timeline: String,
}

impl Default for EscalationOffer {
    fn default() -> Self {
        Self {
            text: "Still interested? Let our team help negotiate!".to_string(),
            action: "Escalate to WhisperCart Support".to_string(),
            benefit: "Our team will contact the seller on your behalf".to_string(),
            timeline: "Response within 2 hours".to_string(),
        }
    }
}

/// Builds the message for `strategy`; unknown or absent strategies use moderate.
pub fn negotiation_message(
    listing: &ProductListing,
    offers: &OfferSet,
    strategy: Option<&str>,
) -> NegotiationMessage {
    let strategy = Strategy::resolve(strategy);
    let subject_title: String = listing.display_name().chars().take(SUBJECT_TITLE_CHARS).collect();

    NegotiationMessage {
        subject: format!("Price inquiry for: {subject_title}"),
        body: offers.select(strategy).message.clone(),
        follow_up: follow_up(strategy).to_string(),
        escalation_text: EscalationOffer::default(),
    }
}

pub fn follow_up(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Aggressive => {
            "I really want this product. Is there any way you can meet my price? I'm a serious buyer."
        }
        Strategy::Moderate => {
            "Let me know if this works for you. I can complete the purchase immediately."
        }
        Strategy::Friendly => "No pressure! Just let me know if you can work with me on the price.",
        Strategy::Bundle => "Buying in bulk helps both of us. Can we make this happen?",
        Strategy::ReviewBased => {
            "I want to make sure I get good quality. Can we work out a fair price?"
        }
    }
}

/// Hand-off of a stalled negotiation to the support team.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub desired_price: Option<Decimal>,
    #[serde(default)]
    pub seller_contact: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationTicket {
    pub escalation_id: String,
    pub status: String,
    pub next_steps: EscalationSteps,
    pub guarantee: String,
    pub support_email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationSteps {
    pub timeline: String,
    pub action: String,
    pub update: String,
}

pub fn escalate(request: &EscalationRequest) -> Result<EscalationTicket, DomainError> {
    escalate_at(request, Utc::now())
}

pub fn escalate_at(
    request: &EscalationRequest,
    now: DateTime<Utc>,
) -> Result<EscalationTicket, DomainError> {
    let product_id = required(request.product_id.as_deref())
        .map(|id| ProductId(id.to_string()))
        .ok_or_else(|| {
            DomainError::InvalidListing("productId and productTitle required".to_string())
        })?;
    if required(request.product_title.as_deref()).is_none() {
        return Err(DomainError::InvalidListing("productId and productTitle required".to_string()));
    }

    Ok(EscalationTicket {
        escalation_id: format!("ESC_{}_{}", product_id.as_str(), now.timestamp_millis()),
        status: "Escalation submitted".to_string(),
        next_steps: EscalationSteps {
            timeline: "1-2 hours".to_string(),
            action: "Our team will contact the seller".to_string(),
            update: "You'll get a notification with any new offers".to_string(),
        },
        guarantee: "If we can't negotiate, we refund your transaction fee".to_string(),
        support_email: SUPPORT_EMAIL.to_string(),
    })
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
