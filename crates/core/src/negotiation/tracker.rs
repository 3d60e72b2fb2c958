use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::domain::offer::Strategy;
use crate::domain::product::ProductId;

pub const DEFAULT_OUTCOME: &str = "sent";
pub const SUCCESS_OUTCOME: &str = "success";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingKey {
    pub product_id: ProductId,
    pub strategy: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub attempts: u64,
    pub successes: u64,
}

/// Counter storage for negotiation attempts.
///
/// `record` must apply the increment atomically per key.
pub trait TrackingStore: Send + Sync {
    fn record(&self, key: TrackingKey, success: bool) -> TrackingEntry;
    fn entries(&self) -> Vec<(TrackingKey, TrackingEntry)>;
}

/// Unbounded process-lifetime store; entries are never evicted.
#[derive(Debug, Default)]
pub struct InMemoryTrackingStore {
    entries: Mutex<HashMap<TrackingKey, TrackingEntry>>,
}

impl TrackingStore for InMemoryTrackingStore {
    fn record(&self, key: TrackingKey, success: bool) -> TrackingEntry {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(key).or_default();
        entry.attempts += 1;
        if success {
            entry.successes += 1;
        }
        *entry
    }

    fn entries(&self) -> Vec<(TrackingKey, TrackingEntry)> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.iter().map(|(key, entry)| (key.clone(), *entry)).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyStats {
    pub strategy: String,
    pub attempts: u64,
    pub successes: u64,
    /// One decimal with a `%` suffix, or `"N/A"` before any attempt.
    pub success_rate: String,
    #[serde(skip)]
    rate_tenths: u64,
}

impl StrategyStats {
    fn new(strategy: impl Into<String>, attempts: u64, successes: u64) -> Self {
        let rate_tenths = if attempts == 0 {
            0
        } else {
            // Half-up rounding to tenths of a percent.
            (successes * 2_000 + attempts) / (attempts * 2)
        };
        let success_rate = if attempts == 0 {
            "N/A".to_string()
        } else {
            format!("{}.{}%", rate_tenths / 10, rate_tenths % 10)
        };

        Self { strategy: strategy.into(), attempts, successes, success_rate, rate_tenths }
    }
}

pub struct NegotiationTracker<S = InMemoryTrackingStore> {
    store: S,
}

impl NegotiationTracker<InMemoryTrackingStore> {
    pub fn new() -> Self {
        Self::with_store(InMemoryTrackingStore::default())
    }
}

impl Default for NegotiationTracker<InMemoryTrackingStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> NegotiationTracker<S>
where
    S: TrackingStore,
{
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    /// Strategy defaults to `moderate` and outcome to `sent`; only
    /// `success` counts towards successes.
    pub fn track(
        &self,
        product_id: &ProductId,
        strategy: Option<&str>,
        outcome: Option<&str>,
    ) -> TrackingEntry {
        let strategy = strategy
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(Strategy::Moderate.as_str());
        let success = outcome.unwrap_or(DEFAULT_OUTCOME) == SUCCESS_OUTCOME;

        self.store.record(
            TrackingKey { product_id: product_id.clone(), strategy: strategy.to_string() },
            success,
        )
    }

    /// Sums every product's entry whose strategy contains `strategy`.
    /// Product ids are not searched, so an id like `moderate-lamp` never
    /// counts towards `moderate`.
    pub fn strategy_stats(&self, strategy: &str) -> StrategyStats {
        let (attempts, successes) = self
            .store
            .entries()
            .into_iter()
            .filter(|(key, _)| key.strategy.contains(strategy))
            .fold((0, 0), |(attempts, successes), (_, entry)| {
                (attempts + entry.attempts, successes + entry.successes)
            });

        StrategyStats::new(strategy, attempts, successes)
    }

    /// Stats for the five strategies, best success rate first. Ties keep
    /// enumeration order.
    pub fn top_strategies(&self) -> Vec<StrategyStats> {
        let mut stats: Vec<StrategyStats> =
            Strategy::ALL.iter().map(|strategy| self.strategy_stats(strategy.as_str())).collect();
        stats.sort_by(|left, right| right.rate_tenths.cmp(&left.rate_tenths));
        stats
    }
}
