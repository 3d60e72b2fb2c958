//! Static vocabulary and phrase tables for the local intent extractor.
//!
//! All patterns run against lower-cased text and are compiled once on first
//! use. Alternatives start on a word boundary so short tokens (`hp`, `lg`,
//! `red`, `tv`) do not fire inside longer words.

use once_cell::sync::Lazy;
use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern must compile")
}

fn word(token: &str) -> Regex {
    compile(&format!(r"\b{}\b", regex::escape(token)))
}

// Actions, highest priority first.
pub static CHECKOUT_EXPLICIT: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:checkout|check out|pay|buy now|purchase now|order now)\b"));
pub static CHECKOUT_SOFT: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:add to cart|buy|purchase|get it)\b"));
pub static WISHLIST: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:wishlist|wish list|save for later|favou?rites?|bookmark)"));
pub static CLEAR_CART: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:clear|empty|delete|remove all)\b"));
pub static COMPARE: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:compare|comparison|vs|versus|difference)\b"));

// Purchase context, first class wins.
pub static GIFT: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:gifts?|birthday|anniversary|present|surprise)\b"));
pub static WORK: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:work|office|business|professional|meetings?)\b"));
pub static REPLACEMENT: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:replace|broken|old one|upgrade|new version)"));

// Purchase intent.
pub static INTENT_URGENT: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:need it now|urgent|emergency|asap|immediately)"));
pub static INTENT_INTERESTED: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:looking for|interested in|thinking about)"));
pub static INTENT_BROWSING: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:just browsing|checking|see what)"));
pub static NEED_PHRASE: Lazy<Regex> = Lazy::new(|| compile(r"\b(?:need|must have|essential)"));

// Urgency refinement.
pub static URGENCY_HIGH: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(?:right now|immediately|urgent|emergency|asap|today|deadline)")
});
pub static URGENCY_MEDIUM: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:soon|this week|quickly|fast)\b"));
pub static URGENCY_LOW: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:eventually|later|whenever|sometime)"));

/// Feature tag a category rule adds once it matched.
pub enum DerivedFeature {
    Always(&'static str),
    /// Tag added when the text contains the substring.
    When(&'static str, &'static str),
    /// Tag added when the text does not contain the substring.
    Unless(&'static str, &'static str),
}

impl DerivedFeature {
    pub fn tag_for(&self, text: &str) -> Option<&'static str> {
        match *self {
            Self::Always(tag) => Some(tag),
            Self::When(needle, tag) => text.contains(needle).then_some(tag),
            Self::Unless(needle, tag) => (!text.contains(needle)).then_some(tag),
        }
    }
}

pub struct CategoryRule {
    pub label: &'static str,
    pub pattern: Regex,
    pub derived: Vec<DerivedFeature>,
}

fn rule(label: &'static str, pattern: &str, derived: Vec<DerivedFeature>) -> CategoryRule {
    CategoryRule { label, pattern: compile(pattern), derived }
}

/// Ordered category rules: electronics, footwear, apparel and accessories,
/// home and kitchen, fitness, books. The first match wins.
pub static CATEGORY_RULES: Lazy<Vec<CategoryRule>> = Lazy::new(|| {
    use DerivedFeature::{Always, Unless, When};

    vec![
        rule(
            "Smartwatch",
            r"\b(?:smart ?watch(?:es)?|apple watch|galaxy watch|fitness tracker)",
            vec![Always("fitness_tracking")],
        ),
        rule(
            "Smartphone",
            r"\b(?:phones?|iphones?|android|smartphones?|mobiles?|pixel|galaxy)\b",
            vec![When("gaming", "gaming_phone")],
        ),
        rule(
            "Laptop",
            r"\b(?:laptops?|macbook|computers?|notebook|dell|hp|lenovo|asus)\b",
            vec![When("gaming", "gaming_laptop")],
        ),
        rule(
            "Headphones",
            r"\b(?:headphones?|earbuds|airpods|sony|bose|audio|wireless)\b",
            vec![When("noise", "noise_cancelling")],
        ),
        rule("Tablet", r"\b(?:tablets?|ipad|kindle|surface)\b", vec![]),
        rule("Smart TV", r"\b(?:tv|tvs|television|smart tv|samsung tv|lg tv)\b", vec![]),
        rule("Smart Speaker", r"\b(?:speakers?|soundbar|alexa|google home)\b", vec![]),
        rule(
            "Running Shoes",
            r"\b(?:shoes?|sneakers?|running shoes?|nike|adidas|puma|footwear)\b",
            vec![When("running", "running"), When("jog", "running"), When("casual", "casual")],
        ),
        rule("Crocs", r"\b(?:crocs?|clogs?)\b", vec![]),
        rule("Boots", r"\b(?:boots?|timberland|dr martens)\b", vec![]),
        rule("Sandals", r"\b(?:sandals?|flip flops?|havaianas)\b", vec![]),
        rule(
            "Jacket",
            r"\b(?:jackets?|hoodies?|coats?|blazers?)\b",
            vec![When("winter", "winter"), When("leather", "leather")],
        ),
        rule(
            "Shirt",
            r"\b(?:shirts?|t-?shirts?|tops?|polos?)\b",
            vec![When("cotton", "cotton"), When("formal", "formal")],
        ),
        rule("Jeans", r"\b(?:jeans|pants|trousers)\b", vec![When("denim", "denim")]),
        rule(
            "Bag",
            r"\b(?:bags?|backpacks?|luggage|travel)\b",
            vec![When("laptop", "laptop_bag")],
        ),
        rule(
            "Watch",
            r"\b(?:watch(?:es)?|wristwatch(?:es)?|rolex|casio|timex)\b",
            vec![Unless("smart", "analog")],
        ),
        rule("Coffee Maker", r"\b(?:coffee maker|nespresso|breville)", vec![]),
        rule("Blender", r"\b(?:blenders?|mixers?|nutribullet)\b", vec![]),
        rule("Air Fryer", r"\b(?:air fryer|instant pot|cooker)", vec![]),
        rule("Dumbbells", r"\b(?:dumbbells?|weights?|gym equipment)\b", vec![]),
        rule("Yoga Mat", r"\b(?:yoga mat|fitness mat)", vec![]),
        rule("Bicycle", r"\b(?:bicycles?|bikes?|cycles?)\b", vec![]),
        rule("Book", r"\b(?:books?|novels?|textbooks?)\b", vec![]),
    ]
});

/// Catch-all phrase used when no category rule fires.
pub static GENERIC_PRODUCT: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?:looking for|find me|show me|i want|i need)\s+(.+?)(?:\s+under|\s+for|\s+with|\s+in|$)")
});

/// Order matters: the first brand found is the one reported.
pub const BRANDS: &[&str] = &[
    "apple", "samsung", "google", "oneplus", "xiaomi", "realme", "oppo", "vivo", "dell", "hp",
    "lenovo", "asus", "acer", "msi", "razer", "alienware", "sony", "bose", "jbl", "sennheiser",
    "marshall", "beats", "nintendo", "playstation", "xbox", "nike", "adidas", "puma", "reebok",
    "under armour", "new balance", "crocs", "havaianas", "skechers", "clarks", "timberland",
    "dr martens", "levis", "wrangler", "pepe jeans", "zara", "h&m", "uniqlo", "forever 21",
    "rolex", "casio", "fossil", "tissot", "nespresso", "breville", "philips", "instant pot",
    "nutribullet", "lg", "panasonic",
];

pub const COLORS: &[&str] = &[
    "red", "blue", "black", "white", "green", "pink", "silver", "gold", "gray", "purple",
    "orange", "yellow", "brown", "navy", "maroon",
];

pub const SIZES: &[&str] = &[
    "small", "medium", "large", "xl", "xxl", "xs", "s", "m", "l", "32", "34", "36", "38", "40",
    "42",
];

pub const SPECS: &[&str] = &[
    "waterproof", "wireless", "gaming", "noise cancelling", "leather", "denim", "cotton",
    "bluetooth", "usb-c", "fast charging", "4k", "hd", "oled", "touchscreen", "mechanical",
    "rgb", "backlit", "ergonomic", "portable", "compact",
];

/// A vocabulary entry paired with the tag it produces.
pub struct Vocabulary {
    pub token: &'static str,
    pub tag: String,
    pub pattern: Regex,
}

pub static BRAND_TABLE: Lazy<Vec<Vocabulary>> = Lazy::new(|| {
    BRANDS
        .iter()
        .map(|brand| Vocabulary {
            token: brand,
            tag: format!("brand_{}", brand.replace(' ', "_")),
            pattern: word(brand),
        })
        .collect()
});

pub static COLOR_TABLE: Lazy<Vec<Vocabulary>> = Lazy::new(|| {
    COLORS
        .iter()
        .map(|color| Vocabulary { token: color, tag: format!("color_{color}"), pattern: word(color) })
        .collect()
});

/// Single-letter sizes only count when introduced by "size".
pub static SIZE_TABLE: Lazy<Vec<Vocabulary>> = Lazy::new(|| {
    SIZES
        .iter()
        .map(|size| {
            let pattern = if size.len() == 1 {
                compile(&format!(r"\bsize\s+{size}\b"))
            } else {
                word(size)
            };
            Vocabulary { token: size, tag: format!("size_{size}"), pattern }
        })
        .collect()
});

/// Multi-word specs match with a space, a hyphen or nothing in between.
pub static SPEC_TABLE: Lazy<Vec<Vocabulary>> = Lazy::new(|| {
    SPECS
        .iter()
        .map(|spec| {
            let body = spec
                .split([' ', '-'])
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"[\s-]?");
            Vocabulary {
                token: spec,
                tag: spec.replace([' ', '-'], "_"),
                pattern: compile(&format!(r"\b{body}\b")),
            }
        })
        .collect()
});

pub static COMBINED_SPECS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (compile(r"\bnoise[\s-]?cancell?ing\b"), "noise_cancelling"),
        (compile(r"\bwater[\s-]?resistant\b"), "water_resistant"),
        (compile(r"\bfast[\s-]?charging\b"), "fast_charging"),
    ]
});

pub static QUANTITY: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(\d+)\s*(?:pieces?|pcs?|items?|units?)\b"));

pub static BUDGET_FRIENDLY: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:cheapest|cheap|budget|affordable|inexpensive)\b"));
pub static PREMIUM_QUALITY: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:premium|luxury|high[\s-]?end|expensive|best)\b"));

const CURRENCY: &str = r"(?:rs\.?|rupees?|₹|inr|usd|\$)";
const AMOUNT: &str = r"(\d[\d,]*(?:\.\d+)?)";

/// Budget phrasings in priority order; capture group 1 is the amount.
pub static BUDGET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        compile(&format!(
            r"\b(?:under|below|less than|within|max(?:imum)?)\s+{CURRENCY}?\s*{AMOUNT}"
        )),
        compile(&format!(r"{CURRENCY}\s*{AMOUNT}\s+(?:or less|maximum|max|at most|below)")),
        compile(&format!(
            r"\bbudget\s+(?:(?:of|is)\s+)?(?:(?:around|about)\s+)?{CURRENCY}?\s*{AMOUNT}"
        )),
        compile(&format!(r"{AMOUNT}\s*(?:rupees?|\brs\b|inr\b|bucks|dollars?|usd\b)")),
        compile(&format!(r"\bno more than\s+{CURRENCY}?\s*{AMOUNT}")),
        compile(&format!(r"(?:₹|\brs\.?|\$|\busd)\s*{AMOUNT}")),
    ]
});

pub static USD_MARKER: Lazy<Regex> = Lazy::new(|| compile(r"\busd\b|\bdollars?\b|\$"));

#[cfg(test)]
mod tests {
    use super::{BRAND_TABLE, BUDGET_PATTERNS, CATEGORY_RULES, SIZE_TABLE, SPEC_TABLE};

    #[test]
    fn every_static_table_compiles() {
        assert_eq!(CATEGORY_RULES.len(), 23);
        assert!(!BRAND_TABLE.is_empty());
        assert_eq!(BUDGET_PATTERNS.len(), 6);
    }

    #[test]
    fn short_tokens_need_word_boundaries() {
        let hp = BRAND_TABLE.iter().find(|entry| entry.token == "hp").expect("hp brand");
        assert!(!hp.pattern.is_match("a cheap laptop"));
        assert!(hp.pattern.is_match("an hp laptop"));

        let small = SIZE_TABLE.iter().find(|entry| entry.token == "s").expect("s size");
        assert!(!small.pattern.is_match("men's shoes"));
        assert!(small.pattern.is_match("tshirt in size s please"));
    }

    #[test]
    fn multi_word_specs_accept_separators() {
        let fast = SPEC_TABLE.iter().find(|entry| entry.tag == "fast_charging").expect("spec");
        assert!(fast.pattern.is_match("fast charging phone"));
        assert!(fast.pattern.is_match("fast-charging phone"));
        assert!(fast.pattern.is_match("fastcharging phone"));

        let usb = SPEC_TABLE.iter().find(|entry| entry.token == "usb-c").expect("usb-c spec");
        assert_eq!(usb.tag, "usb_c");
        assert!(usb.pattern.is_match("usb-c cable"));
    }

    #[test]
    fn headphones_are_not_phones() {
        let phone = CATEGORY_RULES.iter().find(|rule| rule.label == "Smartphone").expect("rule");
        assert!(!phone.pattern.is_match("wireless headphones"));
        assert!(phone.pattern.is_match("a new phone"));
    }
}
