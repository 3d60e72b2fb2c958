//! JSON routes over the agent runtime.
//!
//! - `POST /intent`               - structured intent from a transcript
//! - `POST /negotiate/generate`   - all strategy offers plus a recommendation
//! - `POST /negotiate/message`    - seller-facing message for one strategy
//! - `POST /negotiate/submit`     - record a negotiation outcome
//! - `GET  /negotiate/stats`      - strategies ranked by success rate
//! - `POST /negotiate/escalate`   - hand a negotiation to support
//! - `POST /negotiate`            - conversational negotiation turn
//! - `POST /compare`              - side-by-side comparison of 2-3 listings

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use whispercart_agent::negotiator::{ChatMessage, NegotiationReply};
use whispercart_agent::AgentRuntime;
use whispercart_core::comparison::ProductComparison;
use whispercart_core::domain::intent::IntentRecord;
use whispercart_core::domain::offer::{Offer, OfferSet, StrategySummary};
use whispercart_core::domain::product::{ProductId, ProductListing};
use whispercart_core::errors::{ApplicationError, InterfaceError};
use whispercart_core::negotiation::message::{
    EscalationRequest, EscalationTicket, NegotiationMessage, NEXT_STEPS,
};
use whispercart_core::negotiation::{StrategyStats, TrackingEntry};

#[derive(Clone)]
pub struct ApiState {
    runtime: Arc<AgentRuntime>,
}

impl ApiState {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self { runtime }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn reject(error: impl Into<ApplicationError>) -> (StatusCode, Json<ApiError>) {
    let interface = error.into().into_interface("api");
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiError { error: interface.message().to_string() }))
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    reject(ApplicationError::Validation(message.into()))
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/intent", post(extract_intent))
        .route("/negotiate", post(converse))
        .route("/negotiate/generate", post(generate_offers))
        .route("/negotiate/message", post(negotiation_message))
        .route("/negotiate/submit", post(submit_outcome))
        .route("/negotiate/stats", get(strategy_stats))
        .route("/negotiate/escalate", post(escalate))
        .route("/compare", post(compare))
        .with_state(ApiState::new(runtime))
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    #[serde(flatten)]
    pub intent: IntentRecord,
    pub raw_text: String,
    /// Whether the caller should keep this in the shopper's history.
    pub recordable: bool,
}

/// A missing transcript is not an error; it yields the default record.
pub async fn extract_intent(
    State(state): State<ApiState>,
    Json(body): Json<IntentRequest>,
) -> Json<IntentResponse> {
    let raw_text = body.text.unwrap_or_default();
    let intent = state.runtime.extract_intent(&raw_text).await;
    let recordable = intent.is_recordable();

    Json(IntentResponse { intent, raw_text, recordable })
}

// ---------------------------------------------------------------------------
// Negotiation
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub product: Option<ProductListing>,
    #[serde(default)]
    pub preferred_strategy: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub product_id: Option<ProductId>,
    pub product_title: String,
    pub original_price: Option<Decimal>,
    pub offers: OfferSet,
    pub recommendation: Offer,
    pub strategies: Vec<StrategySummary>,
}

pub async fn generate_offers(
    State(state): State<ApiState>,
    Json(body): Json<GenerateRequest>,
) -> ApiResult<GenerateResponse> {
    let product = body
        .product
        .filter(|product| product.require_price().is_ok())
        .ok_or_else(|| bad_request("Product with price is required"))?;
    let preferred = body.preferred_strategy.as_deref();

    info!(
        event_name = "server.negotiate.generate",
        product = product.display_name(),
        "generating negotiation offers"
    );
    let plan = state.runtime.negotiation_plan(&product, preferred).await;
    state.runtime.track(&product.product_id(), preferred, None);

    Ok(Json(GenerateResponse {
        product_id: product.id.clone(),
        product_title: product.display_name().to_string(),
        original_price: product.price,
        offers: plan.offers,
        recommendation: plan.recommended,
        strategies: plan.strategies,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    #[serde(default)]
    pub product: Option<ProductListing>,
    #[serde(default)]
    pub strategy: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub product_id: Option<ProductId>,
    pub message: NegotiationMessage,
    pub next_steps: Vec<&'static str>,
    pub escalation_available: bool,
}

pub async fn negotiation_message(
    State(state): State<ApiState>,
    Json(body): Json<MessageRequest>,
) -> ApiResult<MessageResponse> {
    let product = body.product.ok_or_else(|| bad_request("Product is required"))?;
    let message = state.runtime.negotiation_message(&product, body.strategy.as_deref()).await;

    Ok(Json(MessageResponse {
        product_id: product.id,
        message,
        next_steps: NEXT_STEPS.to_vec(),
        escalation_available: true,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedAttempt {
    pub product_id: String,
    pub strategy: String,
    pub outcome: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub tracked: TrackedAttempt,
    pub strategy_stats: TrackingEntry,
    pub message: &'static str,
}

pub async fn submit_outcome(
    State(state): State<ApiState>,
    Json(body): Json<SubmitRequest>,
) -> ApiResult<SubmitResponse> {
    let product_id = body
        .product_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| bad_request("productId is required"))?;
    let strategy = body.strategy.unwrap_or_else(|| "moderate".to_string());
    let outcome = body.outcome.unwrap_or_else(|| "sent".to_string());

    let entry = state.runtime.track(
        &ProductId(product_id.clone()),
        Some(strategy.as_str()),
        Some(outcome.as_str()),
    );

    Ok(Json(SubmitResponse {
        success: true,
        message: if outcome == "success" {
            "Great deal! Enjoy your purchase!"
        } else {
            "Negotiation tracked"
        },
        tracked: TrackedAttempt { product_id, strategy, outcome },
        strategy_stats: entry,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsInsights {
    pub best_strategy: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub top_strategies: Vec<StrategyStats>,
    pub insights: StatsInsights,
}

pub async fn strategy_stats(State(state): State<ApiState>) -> Json<StatsResponse> {
    let top_strategies = state.runtime.top_strategies();
    let best_strategy = top_strategies
        .first()
        .map(|stats| stats.strategy.clone())
        .unwrap_or_else(|| "friendly".to_string());

    Json(StatsResponse {
        top_strategies,
        insights: StatsInsights {
            best_strategy,
            message: "Friendly negotiation works best! Most sellers respond positively to \
                      respectful requests.",
        },
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationResponse {
    pub success: bool,
    #[serde(flatten)]
    pub ticket: EscalationTicket,
}

pub async fn escalate(
    State(state): State<ApiState>,
    Json(body): Json<EscalationRequest>,
) -> ApiResult<EscalationResponse> {
    let ticket = state.runtime.escalate(&body).map_err(reject)?;

    Ok(Json(EscalationResponse { success: true, ticket }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverseRequest {
    #[serde(default)]
    pub product: Option<ProductListing>,
    #[serde(default)]
    pub budget: Option<Decimal>,
    #[serde(default)]
    pub messages: Option<Value>,
}

pub async fn converse(
    State(state): State<ApiState>,
    Json(body): Json<ConverseRequest>,
) -> ApiResult<NegotiationReply> {
    let product = body
        .product
        .filter(|product| {
            product.name.as_deref().or(product.title.as_deref()).is_some_and(|name| {
                !name.trim().is_empty()
            }) && product.require_price().is_ok()
        })
        .ok_or_else(|| bad_request("Product name and price are required."))?;
    let messages: Vec<ChatMessage> = match body.messages {
        Some(value @ Value::Array(_)) => serde_json::from_value(value)
            .map_err(|_| bad_request("A messages array is required."))?,
        _ => return Err(bad_request("A messages array is required.")),
    };

    Ok(Json(state.runtime.respond(&product, body.budget, &messages).await))
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    #[serde(default)]
    pub products: Vec<ProductListing>,
}

pub async fn compare(
    State(state): State<ApiState>,
    Json(body): Json<CompareRequest>,
) -> ApiResult<ProductComparison> {
    state.runtime.compare(&body.products).await.map(Json).map_err(reject)
}
