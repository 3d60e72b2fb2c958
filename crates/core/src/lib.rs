pub mod comparison;
pub mod config;
pub mod domain;
pub mod errors;
pub mod negotiation;

pub use comparison::{compare_locally, ProductComparison, ValueLabel};
pub use domain::intent::{
    IntentRecord, PurchaseContext, PurchaseIntent, ShoppingAction, Urgency,
};
pub use domain::offer::{Offer, OfferSet, OfferSource, Probability, Strategy, StrategySummary};
pub use domain::product::{ListingTier, ProductId, ProductListing};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use negotiation::{
    DeterministicOfferGenerator, NegotiationMessage, NegotiationPlan, NegotiationTracker,
    OfferGenerator, StrategyStats, TrackingEntry,
};
