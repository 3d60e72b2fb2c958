use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use whispercart_core::comparison::{self, compare_locally, comparison_prompt, ProductComparison};
use whispercart_core::config::AppConfig;
use whispercart_core::domain::intent::IntentRecord;
use whispercart_core::domain::offer::OfferSet;
use whispercart_core::domain::product::{ProductId, ProductListing};
use whispercart_core::errors::DomainError;
use whispercart_core::negotiation::message::{
    escalate, negotiation_message, EscalationRequest, EscalationTicket, NegotiationMessage,
};
use whispercart_core::negotiation::{
    DeterministicOfferGenerator, NegotiationPlan, NegotiationTracker, OfferGenerator,
    StrategyStats, TrackingEntry,
};

use crate::conversation::{intent_prompt, parse_remote_intent, IntentExtractor};
use crate::llm::{polish_client, remote_model_client, GenerationParams, LlmClient, RemoteModelError};
use crate::negotiator::{local_reply, negotiation_prompt, parse_remote_reply, ChatMessage, NegotiationReply};
use crate::polish::{apply_polish, polish_prompt};

/// A remote model plus the deadline for a single attempt.
#[derive(Clone)]
struct RemoteSlot {
    client: Arc<dyn LlmClient>,
    timeout: Duration,
}

/// Owns every piece of shopping state for one process.
///
/// Each operation that can use a remote model makes at most one attempt
/// and falls back to the local computation on any failure. Remote errors
/// are logged, never returned.
pub struct AgentRuntime<G = DeterministicOfferGenerator> {
    extractor: IntentExtractor,
    offer_generator: G,
    tracker: NegotiationTracker,
    remote: Option<RemoteSlot>,
    polisher: Option<RemoteSlot>,
}

impl AgentRuntime<DeterministicOfferGenerator> {
    /// No remote models; everything runs locally.
    pub fn local() -> Self {
        Self::new(DeterministicOfferGenerator)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, RemoteModelError> {
        let mut runtime = Self::local();
        if let Some(client) = remote_model_client(&config.llm)? {
            runtime = runtime.with_remote(client, Duration::from_secs(config.llm.timeout_secs));
        }
        if let Some(client) = polish_client(&config.polish)? {
            runtime = runtime.with_polisher(client, Duration::from_secs(config.polish.timeout_secs));
        }
        info!(
            event_name = "agent.runtime.initialized",
            remote_model = runtime.remote.as_ref().map(|slot| slot.client.name()),
            polisher = runtime.polisher.as_ref().map(|slot| slot.client.name()),
            "agent runtime ready"
        );
        Ok(runtime)
    }
}

impl Default for AgentRuntime<DeterministicOfferGenerator> {
    fn default() -> Self {
        Self::local()
    }
}

impl<G> AgentRuntime<G>
where
    G: OfferGenerator,
{
    pub fn new(offer_generator: G) -> Self {
        Self {
            extractor: IntentExtractor::new(),
            offer_generator,
            tracker: NegotiationTracker::new(),
            remote: None,
            polisher: None,
        }
    }

    pub fn with_remote(mut self, client: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        self.remote = Some(RemoteSlot { client, timeout });
        self
    }

    pub fn with_polisher(mut self, client: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        self.polisher = Some(RemoteSlot { client, timeout });
        self
    }

    pub fn remote_model(&self) -> Option<&'static str> {
        self.remote.as_ref().map(|slot| slot.client.name())
    }

    pub fn polisher(&self) -> Option<&'static str> {
        self.polisher.as_ref().map(|slot| slot.client.name())
    }

    pub async fn extract_intent(&self, text: &str) -> IntentRecord {
        let remote = attempt(self.remote.as_ref(), &intent_prompt(text), GenerationParams::INTENT)
            .await
            .and_then(|raw| parse_remote_intent(&raw));

        match remote {
            Ok(intent) => intent,
            Err(error) => {
                log_fallback("agent.intent.remote_fallback", &error);
                self.extractor.extract(text)
            }
        }
    }

    /// Heuristic offers, reworded by the polisher when one is configured.
    /// The fallback set is never sent for polishing.
    pub async fn generate_offers(&self, listing: &ProductListing) -> OfferSet {
        let offers = self.offer_generator.generate(listing);
        if offers.is_fallback() || self.polisher.is_none() {
            return offers;
        }

        let polished = attempt(
            self.polisher.as_ref(),
            &polish_prompt(listing, &offers),
            GenerationParams::POLISH,
        )
        .await
        .and_then(|raw| apply_polish(listing, &offers, &raw));

        match polished {
            Ok(polished) => polished,
            Err(error) => {
                log_fallback("agent.offers.polish_fallback", &error);
                offers
            }
        }
    }

    pub async fn negotiation_plan(
        &self,
        listing: &ProductListing,
        preferred: Option<&str>,
    ) -> NegotiationPlan {
        NegotiationPlan::new(self.generate_offers(listing).await, preferred)
    }

    pub async fn negotiation_message(
        &self,
        listing: &ProductListing,
        strategy: Option<&str>,
    ) -> NegotiationMessage {
        let offers = self.generate_offers(listing).await;
        negotiation_message(listing, &offers, strategy)
    }

    pub fn track(
        &self,
        product_id: &ProductId,
        strategy: Option<&str>,
        outcome: Option<&str>,
    ) -> TrackingEntry {
        let entry = self.tracker.track(product_id, strategy, outcome);
        debug!(
            event_name = "agent.negotiation.tracked",
            product_id = product_id.as_str(),
            strategy = strategy.unwrap_or("moderate"),
            attempts = entry.attempts,
            successes = entry.successes,
        );
        entry
    }

    pub fn strategy_stats(&self, strategy: &str) -> StrategyStats {
        self.tracker.strategy_stats(strategy)
    }

    pub fn top_strategies(&self) -> Vec<StrategyStats> {
        self.tracker.top_strategies()
    }

    pub fn escalate(&self, request: &EscalationRequest) -> Result<EscalationTicket, DomainError> {
        let ticket = escalate(request)?;
        info!(
            event_name = "agent.negotiation.escalated",
            escalation_id = %ticket.escalation_id,
            "negotiation escalated to support"
        );
        Ok(ticket)
    }

    /// Errors only for an invalid product count or an unpriced product.
    pub async fn compare(
        &self,
        products: &[ProductListing],
    ) -> Result<ProductComparison, DomainError> {
        comparison::validate(products)?;

        let prompt = format!("<s>[INST] {} [/INST]", comparison_prompt(products));
        let remote = attempt(self.remote.as_ref(), &prompt, GenerationParams::COMPARISON)
            .await
            .and_then(|analysis| {
                let analysis = analysis.trim();
                if analysis.is_empty() {
                    Err(RemoteModelError::MalformedResponse("empty analysis".to_string()))
                } else {
                    Ok(analysis.to_string())
                }
            });

        match remote {
            Ok(analysis) => Ok(ProductComparison { analysis, products: products.to_vec() }),
            Err(error) => {
                log_fallback("agent.compare.remote_fallback", &error);
                compare_locally(products)
            }
        }
    }

    pub async fn respond(
        &self,
        listing: &ProductListing,
        budget: Option<Decimal>,
        messages: &[ChatMessage],
    ) -> NegotiationReply {
        let remote = attempt(
            self.remote.as_ref(),
            &negotiation_prompt(listing, budget, messages),
            GenerationParams::NEGOTIATION,
        )
        .await
        .and_then(|raw| parse_remote_reply(&raw));

        match remote {
            Ok(reply) => reply,
            Err(error) => {
                log_fallback("agent.negotiator.remote_fallback", &error);
                local_reply(listing, budget, messages)
            }
        }
    }
}

async fn attempt(
    slot: Option<&RemoteSlot>,
    prompt: &str,
    params: GenerationParams,
) -> Result<String, RemoteModelError> {
    let slot = slot.ok_or(RemoteModelError::Disabled)?;
    match tokio::time::timeout(slot.timeout, slot.client.complete(prompt, params)).await {
        Ok(result) => result,
        Err(_) => Err(RemoteModelError::Timeout(slot.timeout)),
    }
}

fn log_fallback(event_name: &'static str, error: &RemoteModelError) {
    if matches!(error, RemoteModelError::Disabled) {
        debug!(event_name, "remote model disabled, using local path");
    } else {
        warn!(event_name, error = %error, "remote model failed, using local path");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use whispercart_core::domain::intent::{ShoppingAction, Urgency};
    use whispercart_core::domain::offer::OfferSource;
    use whispercart_core::domain::product::{ProductId, ProductListing};

    use super::AgentRuntime;
    use crate::llm::{GenerationParams, LlmClient, RemoteModelError};
    use crate::negotiator::ChatMessage;

    struct ScriptedClient {
        reply: Result<String, RemoteModelError>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn answering(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: Ok(reply.to_string()), delay: None, calls: AtomicUsize::new(0) })
        }

        fn failing(error: RemoteModelError) -> Arc<Self> {
            Arc::new(Self { reply: Err(error), delay: None, calls: AtomicUsize::new(0) })
        }

        fn stalled() -> Arc<Self> {
            Arc::new(Self {
                reply: Ok("{}".to_string()),
                delay: Some(Duration::from_secs(30)),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(
            &self,
            _prompt: &str,
            _params: GenerationParams,
        ) -> Result<String, RemoteModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone()
        }
    }

    fn runtime_with(client: Arc<ScriptedClient>) -> AgentRuntime {
        AgentRuntime::local().with_remote(client, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn local_runtime_extracts_without_remote() {
        let runtime = AgentRuntime::local();
        let intent = runtime.extract_intent("I want red Nike running shoes under 3000").await;
        assert_eq!(intent.product.as_deref(), Some("Running Shoes"));
        assert_eq!(runtime.remote_model(), None);
    }

    #[tokio::test]
    async fn remote_intent_is_used_when_valid() {
        let client = ScriptedClient::answering(
            r#"{"action":"search","product":"wireless mouse","urgency":"low"}"#,
        );
        let runtime = runtime_with(client.clone());

        let intent = runtime.extract_intent("a mouse please").await;

        assert_eq!(intent.product.as_deref(), Some("Wireless Mouse"));
        assert_eq!(intent.urgency, Urgency::Low);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn loading_model_falls_back_after_one_attempt() {
        let client = ScriptedClient::failing(RemoteModelError::ModelLoading);
        let runtime = runtime_with(client.clone());

        let intent = runtime.extract_intent("please checkout").await;

        assert_eq!(intent.action, ShoppingAction::Checkout);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_remote_output_falls_back() {
        let runtime = runtime_with(ScriptedClient::answering("I think they want a laptop"));
        let intent = runtime.extract_intent("show me a laptop").await;
        assert_eq!(intent.product.as_deref(), Some("Laptop"));
    }

    #[tokio::test]
    async fn stalled_remote_is_abandoned_at_the_deadline() {
        let runtime = runtime_with(ScriptedClient::stalled());

        let started = std::time::Instant::now();
        let intent = runtime.extract_intent("").await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(intent.action, ShoppingAction::Search);
        assert!(intent.product.is_none());
    }

    #[tokio::test]
    async fn polish_failure_returns_heuristic_offers() {
        let runtime = AgentRuntime::local().with_polisher(
            ScriptedClient::failing(RemoteModelError::Status { status: 500, body: String::new() }),
            Duration::from_millis(50),
        );
        let listing = ProductListing::new("Desk Lamp", Decimal::new(1200, 0));

        let offers = runtime.generate_offers(&listing).await;

        assert_eq!(offers.source, OfferSource::Heuristic);
        assert!(offers.bundle.is_some());
    }

    #[tokio::test]
    async fn fallback_offers_skip_the_polisher() {
        let client = ScriptedClient::answering(r#"{"friendly": "hello"}"#);
        let runtime =
            AgentRuntime::local().with_polisher(client.clone(), Duration::from_millis(50));

        let offers = runtime.generate_offers(&ProductListing::default()).await;

        assert_eq!(offers.source, OfferSource::Fallback);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn polished_offers_replace_messages() {
        let client = ScriptedClient::answering(r#"{"friendly": "Hi! Any wiggle room on price?"}"#);
        let runtime = AgentRuntime::local().with_polisher(client, Duration::from_millis(50));
        let listing = ProductListing::new("Desk Lamp", Decimal::new(1200, 0));

        let plan = runtime.negotiation_plan(&listing, Some("friendly")).await;

        assert_eq!(plan.offers.source, OfferSource::Polished);
        assert_eq!(plan.recommended.message, "Hi! Any wiggle room on price?");
    }

    #[tokio::test]
    async fn tracker_lives_with_the_runtime() {
        let runtime = AgentRuntime::local();
        let product = ProductId("P1".to_string());
        runtime.track(&product, Some("friendly"), Some("success"));
        runtime.track(&product, Some("friendly"), None);

        assert_eq!(runtime.strategy_stats("friendly").success_rate, "50.0%");
        assert_eq!(runtime.top_strategies()[0].strategy, "friendly");
    }

    #[tokio::test]
    async fn comparison_validates_before_calling_remote() {
        let client = ScriptedClient::answering("A is better");
        let runtime = runtime_with(client.clone());

        let single = vec![ProductListing::new("A", Decimal::new(100, 0))];
        assert!(runtime.compare(&single).await.is_err());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);

        let pair = vec![
            ProductListing::new("A", Decimal::new(100, 0)),
            ProductListing::new("B", Decimal::new(200, 0)),
        ];
        let comparison = runtime.compare(&pair).await.expect("comparison");
        assert_eq!(comparison.analysis, "A is better");
    }

    #[tokio::test]
    async fn conversational_reply_falls_back_locally() {
        let runtime = runtime_with(ScriptedClient::failing(RemoteModelError::Transport(
            "connection refused".to_string(),
        )));
        let listing = ProductListing::new("Kettle", Decimal::new(1000, 0));

        let reply = runtime.respond(&listing, None, &[ChatMessage::user("cheaper please")]).await;

        assert_eq!(reply.proposed_price, Some(Decimal::new(92000, 2)));
    }
}
