use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use whispercart_core::domain::intent::{
    IntentRecord, PurchaseContext, PurchaseIntent, ShoppingAction, Urgency,
};

use crate::llm::{extract_json_object, RemoteModelError};
use crate::patterns::{
    BRAND_TABLE, BUDGET_FRIENDLY, BUDGET_PATTERNS, CATEGORY_RULES, CHECKOUT_EXPLICIT,
    CHECKOUT_SOFT, CLEAR_CART, COLOR_TABLE, COMBINED_SPECS, COMPARE, GENERIC_PRODUCT, GIFT,
    INTENT_BROWSING, INTENT_INTERESTED, INTENT_URGENT, NEED_PHRASE, PREMIUM_QUALITY, QUANTITY,
    REPLACEMENT, SIZE_TABLE, SPEC_TABLE, URGENCY_HIGH, URGENCY_LOW, URGENCY_MEDIUM, USD_MARKER,
    WISHLIST, WORK,
};

/// Budgets below this are assumed to be in US dollars when the text says so.
const USD_THRESHOLD: i64 = 1_000;
const USD_TO_INR: i64 = 83;

/// Rule-based extractor used when no remote model is configured or the
/// remote call fails. Total over every string input.
#[derive(Clone, Debug, Default)]
pub struct IntentExtractor;

impl IntentExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> IntentRecord {
        let lower = text.to_lowercase();
        let mut features = Vec::new();

        let (action, mut purchase_intent) = detect_action(&lower);
        let context = detect_context(&lower);
        let mut urgency = Urgency::Medium;

        if INTENT_URGENT.is_match(&lower) {
            purchase_intent = PurchaseIntent::Urgent;
            urgency = Urgency::High;
        } else if INTENT_INTERESTED.is_match(&lower) {
            purchase_intent = PurchaseIntent::Interested;
        } else if INTENT_BROWSING.is_match(&lower) {
            purchase_intent = PurchaseIntent::Browsing;
        }

        let product = if action == ShoppingAction::Search {
            detect_product(&lower, &mut features)
        } else {
            None
        };

        let brand = detect_brand(&lower, &mut features);
        detect_attributes(&lower, &mut features);
        let budget = extract_budget(&lower);

        if URGENCY_HIGH.is_match(&lower) {
            urgency = Urgency::High;
        } else if urgency != Urgency::High {
            if URGENCY_MEDIUM.is_match(&lower) {
                urgency = Urgency::Medium;
            } else if URGENCY_LOW.is_match(&lower) {
                urgency = Urgency::Low;
            }
        }

        if urgency == Urgency::High && NEED_PHRASE.is_match(&lower) {
            purchase_intent = PurchaseIntent::Urgent;
        }

        if let Some(quantity) = QUANTITY.captures(&lower).and_then(|captures| captures.get(1)) {
            features.push(format!("quantity_{}", quantity.as_str()));
        }

        if BUDGET_FRIENDLY.is_match(&lower) {
            features.push("budget_friendly".to_string());
        } else if PREMIUM_QUALITY.is_match(&lower) {
            features.push("premium_quality".to_string());
        }

        IntentRecord {
            action,
            product,
            budget,
            features,
            urgency,
            context,
            purchase_intent,
            brand,
        }
        .normalized()
    }
}

fn detect_action(lower: &str) -> (ShoppingAction, PurchaseIntent) {
    if CHECKOUT_EXPLICIT.is_match(lower) {
        (ShoppingAction::Checkout, PurchaseIntent::ReadyToBuy)
    } else if CHECKOUT_SOFT.is_match(lower) {
        (ShoppingAction::Checkout, PurchaseIntent::Interested)
    } else if WISHLIST.is_match(lower) {
        (ShoppingAction::Wishlist, PurchaseIntent::Browsing)
    } else if CLEAR_CART.is_match(lower) {
        (ShoppingAction::ClearCart, PurchaseIntent::Browsing)
    } else if COMPARE.is_match(lower) {
        (ShoppingAction::Compare, PurchaseIntent::Browsing)
    } else {
        (ShoppingAction::Search, PurchaseIntent::Browsing)
    }
}

fn detect_context(lower: &str) -> PurchaseContext {
    if GIFT.is_match(lower) {
        PurchaseContext::Gift
    } else if WORK.is_match(lower) {
        PurchaseContext::Work
    } else if REPLACEMENT.is_match(lower) {
        PurchaseContext::Replacement
    } else {
        PurchaseContext::Personal
    }
}

fn detect_product(lower: &str, features: &mut Vec<String>) -> Option<String> {
    if let Some(rule) = CATEGORY_RULES.iter().find(|rule| rule.pattern.is_match(lower)) {
        features.extend(
            rule.derived.iter().filter_map(|derived| derived.tag_for(lower)).map(str::to_string),
        );
        return Some(rule.label.to_string());
    }

    GENERIC_PRODUCT
        .captures(lower)
        .and_then(|captures| captures.get(1))
        .map(|phrase| phrase.as_str().trim().to_string())
        .filter(|phrase| !phrase.is_empty())
}

fn detect_brand(lower: &str, features: &mut Vec<String>) -> Option<String> {
    let entry = BRAND_TABLE.iter().find(|entry| entry.pattern.is_match(lower))?;
    features.push(entry.tag.clone());
    Some(title_case(entry.token))
}

fn detect_attributes(lower: &str, features: &mut Vec<String>) {
    for table in [&*COLOR_TABLE, &*SIZE_TABLE, &*SPEC_TABLE] {
        features.extend(
            table
                .iter()
                .filter(|entry| entry.pattern.is_match(lower))
                .map(|entry| entry.tag.clone()),
        );
    }
    features.extend(
        COMBINED_SPECS
            .iter()
            .filter(|(pattern, _)| pattern.is_match(lower))
            .map(|(_, tag)| (*tag).to_string()),
    );
}

/// First pattern in priority order wins, regardless of the amount.
fn extract_budget(lower: &str) -> Option<Decimal> {
    let amount = BUDGET_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(lower).and_then(|captures| captures.get(1)))?;
    let budget = Decimal::from_str(&amount.as_str().replace(',', "")).ok()?;

    if USD_MARKER.is_match(lower) && budget < Decimal::from(USD_THRESHOLD) {
        return Some(budget * Decimal::from(USD_TO_INR));
    }
    Some(budget)
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn intent_prompt(text: &str) -> String {
    format!(
        "<s>[INST] You are WhisperCart Shopping Agent. Extract JSON from this transcript: \"{text}\".\n\
         Fields:\n\
         - action (string: \"search\", \"checkout\", \"wishlist\", \"clear_cart\", \"compare\")\n\
         - product (string, e.g. \"Gaming Laptop\")\n\
         - budget (number, pure integer)\n\
         - features (array of strings, e.g. [\"blue\", \"waterproof\"])\n\
         - urgency (high/medium/low)\n\
         - context (personal/gift/work/replacement)\n\
         - purchaseIntent (browsing/interested/ready_to_buy/urgent)\n\
         - brand (string or null)\n\
         Only return the JSON object. Do not explain. [/INST]"
    )
}

/// Maps loosely-shaped model output onto a complete record. Unknown enum
/// values fall back to their defaults.
pub fn parse_remote_intent(raw: &str) -> Result<IntentRecord, RemoteModelError> {
    let object = extract_json_object(raw)?;
    let value: Value = serde_json::from_str(object)
        .map_err(|error| RemoteModelError::MalformedResponse(error.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(RemoteModelError::MalformedResponse("expected a JSON object".to_string()));
    };

    let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::trim);
    let non_empty = |key: &str| text(key).filter(|value| !value.is_empty());

    let features = fields
        .get("features")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|feature| feature.trim().to_lowercase())
                .filter(|feature| !feature.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let record = IntentRecord {
        action: text("action").and_then(ShoppingAction::parse_lenient).unwrap_or_default(),
        product: non_empty("product").map(title_case),
        budget: fields.get("budget").and_then(parse_budget_value),
        features,
        urgency: text("urgency").and_then(Urgency::parse_lenient).unwrap_or_default(),
        context: text("context").and_then(PurchaseContext::parse_lenient).unwrap_or_default(),
        purchase_intent: text("purchaseIntent")
            .or_else(|| text("purchase_intent"))
            .and_then(PurchaseIntent::parse_lenient)
            .unwrap_or_default(),
        brand: non_empty("brand").map(title_case),
    };

    Ok(record.normalized())
}

fn parse_budget_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(Decimal::from)
            .or_else(|| number.as_f64().and_then(Decimal::from_f64)),
        Value::String(raw) => {
            let digits: String =
                raw.chars().filter(|ch| ch.is_ascii_digit() || *ch == '.').collect();
            Decimal::from_str(&digits).ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use whispercart_core::domain::intent::{
        IntentRecord, PurchaseContext, PurchaseIntent, ShoppingAction, Urgency,
    };

    use super::{parse_remote_intent, IntentExtractor};

    fn extract(text: &str) -> IntentRecord {
        IntentExtractor::new().extract(text)
    }

    #[test]
    fn empty_text_yields_documented_defaults() {
        assert_eq!(extract(""), IntentRecord::default());
        assert_eq!(extract("hello there"), IntentRecord::default());
    }

    #[test]
    fn checkout_outranks_wishlist() {
        let intent = extract("please checkout and add to wishlist");
        assert_eq!(intent.action, ShoppingAction::Checkout);
        assert_eq!(intent.purchase_intent, PurchaseIntent::ReadyToBuy);
        assert!(intent.product.is_none());
    }

    #[test]
    fn soft_checkout_marks_interest_only() {
        let intent = extract("add to cart");
        assert_eq!(intent.action, ShoppingAction::Checkout);
        assert_eq!(intent.purchase_intent, PurchaseIntent::Interested);
    }

    #[test]
    fn remaining_actions_follow_priority() {
        assert_eq!(extract("save for later").action, ShoppingAction::Wishlist);
        assert_eq!(extract("empty my cart").action, ShoppingAction::ClearCart);
        assert_eq!(extract("iphone vs pixel").action, ShoppingAction::Compare);
        assert!(extract("iphone vs pixel").product.is_none());
    }

    #[test]
    fn budget_phrasings_strip_separators() {
        assert_eq!(extract("I want shoes under 2000").budget, Some(Decimal::new(2000, 0)));
        assert_eq!(extract("I want shoes under ₹2,000").budget, Some(Decimal::new(2000, 0)));
        assert_eq!(extract("I want shoes").budget, None);
        assert_eq!(extract("budget of rs 15,500 for a tablet").budget, Some(Decimal::new(15500, 0)));
        assert_eq!(extract("earbuds for 1500 rupees").budget, Some(Decimal::new(1500, 0)));
    }

    #[test]
    fn first_budget_pattern_wins_over_larger_amounts() {
        let intent = extract("a 5000 rupees phone, but under 3000 would be ideal");
        assert_eq!(intent.budget, Some(Decimal::new(3000, 0)));
    }

    #[test]
    fn small_dollar_budgets_convert_to_rupees() {
        assert_eq!(extract("headphones under $50").budget, Some(Decimal::new(4150, 0)));
        assert_eq!(extract("laptop under 1200 usd").budget, Some(Decimal::new(1200, 0)));
    }

    #[test]
    fn category_brand_and_features_compose() {
        let intent = extract("I want red Nike running shoes under 3000");

        assert_eq!(intent.action, ShoppingAction::Search);
        assert_eq!(intent.product.as_deref(), Some("Running Shoes"));
        assert_eq!(intent.brand.as_deref(), Some("Nike"));
        assert_eq!(intent.budget, Some(Decimal::new(3000, 0)));
        for tag in ["color_red", "brand_nike", "running"] {
            assert!(intent.has_feature(tag), "missing {tag} in {:?}", intent.features);
        }
    }

    #[test]
    fn urgent_gift_laptop_scenario() {
        let intent = extract("Looking for a gaming laptop under 60000, need it urgently as a gift");

        assert_eq!(intent.action, ShoppingAction::Search);
        assert_eq!(intent.product.as_deref(), Some("Laptop"));
        assert!(intent.has_feature("gaming_laptop"));
        assert_eq!(intent.budget, Some(Decimal::new(60000, 0)));
        assert_eq!(intent.urgency, Urgency::High);
        assert_eq!(intent.context, PurchaseContext::Gift);
        assert_eq!(intent.purchase_intent, PurchaseIntent::Urgent);
    }

    #[test]
    fn watches_split_between_smart_and_analog() {
        let smart = extract("show me a smartwatch");
        assert_eq!(smart.product.as_deref(), Some("Smartwatch"));
        assert!(smart.has_feature("fitness_tracking"));

        let analog = extract("show me a casio watch");
        assert_eq!(analog.product.as_deref(), Some("Watch"));
        assert!(analog.has_feature("analog"));
        assert_eq!(analog.brand.as_deref(), Some("Casio"));
    }

    #[test]
    fn generic_phrase_used_when_no_category_matches() {
        let intent = extract("find me a scented candle under 500");
        assert_eq!(intent.product.as_deref(), Some("a scented candle"));
        assert_eq!(intent.budget, Some(Decimal::new(500, 0)));
    }

    #[test]
    fn urgency_refinement_never_downgrades_high() {
        assert_eq!(extract("need a charger asap, soon if possible").urgency, Urgency::High);
        assert_eq!(extract("a tablet, sometime later").urgency, Urgency::Low);
        assert_eq!(extract("a tablet this week").urgency, Urgency::Medium);
    }

    #[test]
    fn quantity_and_price_preference_tags() {
        let intent = extract("looking for 3 pieces of cheap cotton shirts in size m");
        assert!(intent.has_feature("quantity_3"));
        assert!(intent.has_feature("budget_friendly"));
        assert!(intent.has_feature("cotton"));
        assert!(intent.has_feature("size_m"));
        assert_eq!(intent.product.as_deref(), Some("Shirt"));
        assert_eq!(intent.purchase_intent, PurchaseIntent::Interested);

        assert!(extract("premium headphones").has_feature("premium_quality"));
    }

    #[test]
    fn feature_tags_are_deduplicated() {
        let intent = extract("noise cancelling sony headphones");
        let count = intent.features.iter().filter(|tag| *tag == "noise_cancelling").count();
        assert_eq!(count, 1);
        assert_eq!(intent.product.as_deref(), Some("Headphones"));
    }

    #[test]
    fn multi_word_brands_are_title_cased() {
        let intent = extract("new balance sneakers");
        assert_eq!(intent.brand.as_deref(), Some("New Balance"));
        assert!(intent.has_feature("brand_new_balance"));
    }

    #[test]
    fn remote_output_is_normalised() {
        let raw = r#"Sure! {"action": "Search", "product": "gaming laptop", "budget": "60,000",
            "features": ["RGB", "rgb", " "], "urgency": "HIGH", "purchaseIntent": "ready to buy",
            "context": "party"}"#;

        let intent = parse_remote_intent(raw).expect("parsable");

        assert_eq!(intent.product.as_deref(), Some("Gaming Laptop"));
        assert_eq!(intent.budget, Some(Decimal::new(60000, 0)));
        assert_eq!(intent.features, vec!["rgb".to_string()]);
        assert_eq!(intent.urgency, Urgency::High);
        assert_eq!(intent.purchase_intent, PurchaseIntent::ReadyToBuy);
        assert_eq!(intent.context, PurchaseContext::Personal);
    }

    #[test]
    fn remote_non_search_drops_product() {
        let intent = parse_remote_intent(r#"{"action": "checkout", "product": "phone"}"#)
            .expect("parsable");
        assert_eq!(intent.action, ShoppingAction::Checkout);
        assert!(intent.product.is_none());
    }

    #[test]
    fn remote_output_without_json_is_rejected() {
        assert!(parse_remote_intent("the model is thinking").is_err());
        assert!(parse_remote_intent("{not json}").is_err());
    }
}
