//! Chat-style negotiation with the shopper about a single listing.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use whispercart_core::domain::product::ProductListing;

use crate::llm::{extract_json_object, RemoteModelError};

static PRICE_TALK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:discount|cheaper|lower|price|bargain|negotiate|expensive|less)")
        .expect("static pattern must compile")
});
static CLOSING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsounds good\b").expect("static pattern must compile"));
static FEATURE_TALK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:why|feature|better|good|worth|details|quality)")
        .expect("static pattern must compile")
});
static ACCEPTANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:yes|ok|okay|sure|add|buy|get)\b").expect("static pattern must compile")
});

/// Budgets below this share of the price unlock the deeper discount.
const LOW_BUDGET_RATIO: Decimal = Decimal::from_parts(85, 0, 0, false, 2);
const DEEP_DISCOUNT_RATIO: Decimal = Decimal::from_parts(88, 0, 0, false, 2);
const STANDARD_DISCOUNT_RATIO: Decimal = Decimal::from_parts(92, 0, 0, false, 2);

/// One turn of the conversation. Clients send either `text` or `content`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { sender: Some("user".to_string()), text: Some(text.into()), content: None }
    }

    pub fn body(&self) -> &str {
        self.text.as_deref().or(self.content.as_deref()).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationReply {
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_accepted: Option<bool>,
}

impl NegotiationReply {
    fn text(response_text: String) -> Self {
        Self { response_text, proposed_price: None, deal_accepted: None }
    }
}

/// Rule-based reply keyed on the shopper's last message.
pub fn local_reply(
    listing: &ProductListing,
    budget: Option<Decimal>,
    messages: &[ChatMessage],
) -> NegotiationReply {
    let name = listing.display_name();
    let price = listing.price.unwrap_or(Decimal::ZERO);
    let last = messages.last().map(ChatMessage::body).unwrap_or_default().to_lowercase();

    if PRICE_TALK.is_match(&last) {
        let low_budget = price.checked_mul(LOW_BUDGET_RATIO);
        let tight = budget.filter(|budget| low_budget.is_some_and(|limit| *budget < limit));
        if let Some(budget) = tight {
            let deep = share_of(price, DEEP_DISCOUNT_RATIO);
            return NegotiationReply {
                response_text: format!(
                    "I see your budget is ₹{}. While it's quite low for this premium {name}, I can \
                     authorize a \"First-Time Buyer\" discount to bring it down to ₹{deep}. \
                     That's my absolute best offer!",
                    budget.normalize()
                ),
                proposed_price: Some(deep),
                deal_accepted: None,
            };
        }
        let discounted = share_of(price, STANDARD_DISCOUNT_RATIO);
        return NegotiationReply {
            response_text: format!(
                "I definitely want to help you get this {name}! I can drop the price from ₹{} to \
                 ₹{discounted} if you're ready to order now. What do you think?",
                price.normalize()
            ),
            proposed_price: Some(discounted),
            deal_accepted: None,
        };
    }

    if !CLOSING.is_match(&last) && FEATURE_TALK.is_match(&last) {
        return NegotiationReply::text(format!(
            "This {name} stands out for its durability and highly-rated performance. It's \
             currently a hot seller, and at ₹{}, it's a very competitive deal for these specs!",
            price.normalize()
        ));
    }

    if CLOSING.is_match(&last) || ACCEPTANCE.is_match(&last) {
        return NegotiationReply {
            response_text: format!(
                "Awesome! I've marked the {name} at the discounted rate. Click \"Add to Cart\" \
                 below and we'll get it shipped out to you!"
            ),
            proposed_price: None,
            deal_accepted: Some(true),
        };
    }

    NegotiationReply::text(format!(
        "Hi! I'm your WhisperCart Assistant. I'm looking at the {name} (₹{}) with you. Are you \
         looking for a better price, or do you have questions about its features?",
        price.normalize()
    ))
}

/// Falls back to the full price when the product leaves `Decimal`'s range.
fn share_of(price: Decimal, ratio: Decimal) -> Decimal {
    price.checked_mul(ratio).map(two_places).unwrap_or(price)
}

fn two_places(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn negotiation_prompt(
    listing: &ProductListing,
    budget: Option<Decimal>,
    messages: &[ChatMessage],
) -> String {
    let history: Vec<String> = messages
        .iter()
        .map(|message| {
            format!("{}: {}", message.sender.as_deref().unwrap_or("user"), message.body())
        })
        .collect();
    let price = listing.price.map(|price| price.normalize().to_string());
    let budget = budget.map(|budget| budget.normalize().to_string());

    format!(
        "<s>[INST] You are a helpful WhisperCart AI negotiation agent. Your goal is to negotiate \
         a good deal for the user on a product.\n\
         Here is the product information:\n\
         Product: {}, Current Price: {}, User Budget: {}\n\n\
         Here is the conversation history so far:\n{}\n\n\
         Based on the conversation and product details, decide on a response.\n\
         Your response should be a JSON object with the following fields:\n\
         - responseText (string): Your conversational message to the user.\n\
         - proposedPrice (number, optional): A new price you are offering. Only include if you \
         are making a specific offer.\n\
         - dealAccepted (boolean, optional): Set to true if the user has accepted a deal and \
         the negotiation should end.\n\n\
         Be creative but stay focused on negotiation. Do not offer unrealistic discounts. If the \
         user accepts, set dealAccepted to true.\n\
         Only return the JSON object. Do not explain. [/INST]",
        listing.display_name(),
        price.as_deref().unwrap_or("unknown"),
        budget.as_deref().unwrap_or("not specified"),
        history.join("\n"),
    )
}

/// `responseText` is mandatory; a price the model cannot express as a
/// number is dropped rather than failing the reply.
pub fn parse_remote_reply(raw: &str) -> Result<NegotiationReply, RemoteModelError> {
    let object = extract_json_object(raw)?;
    let value: Value = serde_json::from_str(object)
        .map_err(|error| RemoteModelError::MalformedResponse(error.to_string()))?;

    let response_text = value
        .get("responseText")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| RemoteModelError::MalformedResponse("missing responseText".to_string()))?;

    let proposed_price = value.get("proposedPrice").and_then(|price| match price {
        Value::Number(number) => number.as_f64().and_then(Decimal::from_f64).map(two_places),
        Value::String(raw) => raw.trim().trim_start_matches('₹').parse().ok(),
        _ => None,
    });

    Ok(NegotiationReply {
        response_text: response_text.to_string(),
        proposed_price,
        deal_accepted: value.get("dealAccepted").and_then(Value::as_bool),
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use whispercart_core::domain::product::ProductListing;

    use super::{local_reply, negotiation_prompt, parse_remote_reply, ChatMessage};

    fn listing() -> ProductListing {
        ProductListing::new("Boat Rockerz 450", Decimal::new(3000, 0))
    }

    #[test]
    fn price_talk_proposes_standard_discount() {
        let reply = local_reply(&listing(), None, &[ChatMessage::user("Can you do a lower price?")]);
        assert_eq!(reply.proposed_price, Some(Decimal::new(276000, 2)));
        assert!(reply.response_text.contains("from ₹3000 to ₹2760.00"));
        assert!(reply.deal_accepted.is_none());
    }

    #[test]
    fn tight_budget_unlocks_deeper_discount() {
        let reply = local_reply(
            &listing(),
            Some(Decimal::new(2000, 0)),
            &[ChatMessage::user("That's too expensive")],
        );
        assert_eq!(reply.proposed_price, Some(Decimal::new(264000, 2)));
        assert!(reply.response_text.contains("budget is ₹2000"));
    }

    #[test]
    fn budget_near_price_keeps_standard_discount() {
        let reply = local_reply(
            &listing(),
            Some(Decimal::new(2900, 0)),
            &[ChatMessage::user("any discount?")],
        );
        assert_eq!(reply.proposed_price, Some(Decimal::new(276000, 2)));
    }

    #[test]
    fn enormous_prices_do_not_break_price_talk() {
        let listing = ProductListing::new("Superyacht", Decimal::MAX);
        let reply = local_reply(&listing, Some(Decimal::ONE), &[ChatMessage::user("cheaper?")]);
        assert!(reply.proposed_price.is_some());
    }

    #[test]
    fn feature_questions_get_a_value_pitch() {
        let reply = local_reply(&listing(), None, &[ChatMessage::user("Why is it worth it?")]);
        assert!(reply.response_text.contains("at ₹3000, it's a very competitive deal"));
        assert!(reply.proposed_price.is_none());
    }

    #[test]
    fn acceptance_closes_the_deal() {
        for text in ["yes please", "Sounds good!", "ok"] {
            let reply = local_reply(&listing(), None, &[ChatMessage::user(text)]);
            assert_eq!(reply.deal_accepted, Some(true), "{text}");
        }
    }

    #[test]
    fn empty_history_gets_a_greeting() {
        let reply = local_reply(&listing(), None, &[]);
        assert!(reply.response_text.starts_with("Hi! I'm your WhisperCart Assistant"));
        assert!(reply.response_text.contains("Boat Rockerz 450 (₹3000)"));
    }

    #[test]
    fn content_field_is_read_when_text_is_missing() {
        let message: ChatMessage =
            serde_json::from_str(r#"{"sender":"user","content":"cheaper?"}"#).expect("message");
        assert_eq!(message.body(), "cheaper?");
        let reply = local_reply(&listing(), None, &[message]);
        assert!(reply.proposed_price.is_some());
    }

    #[test]
    fn prompt_carries_history_and_budget() {
        let prompt = negotiation_prompt(&listing(), None, &[ChatMessage::user("hello")]);
        assert!(prompt.contains("Current Price: 3000, User Budget: not specified"));
        assert!(prompt.contains("user: hello"));
    }

    #[test]
    fn remote_reply_requires_response_text() {
        let reply = parse_remote_reply(
            r#"{"responseText": "I can do 2800", "proposedPrice": 2800, "dealAccepted": false}"#,
        )
        .expect("reply");
        assert_eq!(reply.proposed_price, Some(Decimal::new(2800, 0)));
        assert_eq!(reply.deal_accepted, Some(false));

        assert!(parse_remote_reply(r#"{"proposedPrice": 2800}"#).is_err());
    }
}
