use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShoppingAction {
    #[default]
    Search,
    Checkout,
    Wishlist,
    ClearCart,
    Compare,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseContext {
    #[default]
    Personal,
    Gift,
    Work,
    Replacement,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseIntent {
    #[default]
    Browsing,
    Interested,
    ReadyToBuy,
    Urgent,
}

macro_rules! lenient_parse {
    ($ty:ty { $($text:literal => $variant:ident),+ $(,)? }) => {
        impl $ty {
            /// Maps free-form model output onto the enum, `None` when unrecognised.
            pub fn parse_lenient(value: &str) -> Option<Self> {
                let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
                match normalized.as_str() {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

lenient_parse!(ShoppingAction {
    "search" => Search,
    "checkout" => Checkout,
    "wishlist" => Wishlist,
    "clear_cart" => ClearCart,
    "compare" => Compare,
});

lenient_parse!(Urgency {
    "low" => Low,
    "medium" => Medium,
    "high" => High,
});

lenient_parse!(PurchaseContext {
    "personal" => Personal,
    "gift" => Gift,
    "work" => Work,
    "replacement" => Replacement,
});

lenient_parse!(PurchaseIntent {
    "browsing" => Browsing,
    "interested" => Interested,
    "ready_to_buy" => ReadyToBuy,
    "urgent" => Urgent,
});

/// Structured interpretation of one shopping utterance.
///
/// `product` is always `None` unless `action` is [`ShoppingAction::Search`],
/// and `features` never holds the same tag twice. Both are enforced by
/// [`IntentRecord::normalized`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRecord {
    pub action: ShoppingAction,
    pub product: Option<String>,
    pub budget: Option<Decimal>,
    pub features: Vec<String>,
    pub urgency: Urgency,
    pub context: PurchaseContext,
    pub purchase_intent: PurchaseIntent,
    pub brand: Option<String>,
}

impl IntentRecord {
    pub fn normalized(mut self) -> Self {
        if self.action != ShoppingAction::Search {
            self.product = None;
        }
        if matches!(self.budget, Some(budget) if budget < Decimal::ZERO) {
            self.budget = None;
        }
        self.features = dedup_preserving_order(self.features);
        self
    }

    pub fn has_feature(&self, tag: &str) -> bool {
        self.features.iter().any(|feature| feature == tag)
    }

    /// History is only worth recording when a product was recognised.
    pub fn is_recordable(&self) -> bool {
        self.product.is_some()
    }
}

pub fn dedup_preserving_order(features: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(features.len());
    features.into_iter().filter(|feature| seen.insert(feature.clone())).collect()
}
