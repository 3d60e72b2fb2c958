//! Negotiation engine: discount heuristic, strategy offers, seller messages
//! and outcome tracking.

pub mod discount;
pub mod message;
pub mod offers;
pub mod strategies;
pub mod tracker;

pub use discount::{apply_discount, discount_potential, SellerConfidence, MAX_DISCOUNT_PCT};
pub use message::{
    escalate, negotiation_message, EscalationOffer, EscalationRequest, EscalationTicket,
    NegotiationMessage,
};
pub use offers::{DeterministicOfferGenerator, NegotiationPlan, OfferGenerator};
pub use strategies::fallback_offers;
pub use tracker::{
    InMemoryTrackingStore, NegotiationTracker, StrategyStats, TrackingEntry, TrackingKey,
    TrackingStore,
};
