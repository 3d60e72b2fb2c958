use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use whispercart_agent::llm::{polish_client, remote_model_client};
use whispercart_agent::{GenerationParams, IntentExtractor, LlmClient};
use whispercart_core::config::{AppConfig, LoadOptions};
use rust_decimal::Decimal;
use whispercart_core::domain::intent::ShoppingAction;
use whispercart_core::domain::product::ProductListing;
use whispercart_core::negotiation::{DeterministicOfferGenerator, OfferGenerator};

const READY_PROMPT: &str = "Reply with the single word: ready";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = vec![check_local_engine()];

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_remote(
                "remote_model",
                remote_model_client(&config.llm),
                config.llm.timeout_secs,
                "no credentials configured; intent and chat use local rules",
            ));
            checks.push(check_remote(
                "offer_polish",
                polish_client(&config.polish),
                config.polish.timeout_secs,
                "no polish key configured; offers keep heuristic wording",
            ));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["remote_model", "offer_polish"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    // Remote models are optional; only a failed check degrades the report.
    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_local_engine() -> DoctorCheck {
    let intent = IntentExtractor::new().extract("need wireless earbuds under 2000");
    let listing = ProductListing::new("Check Earbuds", Decimal::new(1999, 0));
    let offers = DeterministicOfferGenerator.generate(&listing);

    let healthy = intent.action == ShoppingAction::Search
        && intent.budget == Some(Decimal::new(2000, 0))
        && !offers.is_fallback();
    DoctorCheck {
        name: "local_engine",
        status: if healthy { CheckStatus::Pass } else { CheckStatus::Fail },
        details: if healthy {
            "intent rules and offer heuristics produced the expected results".to_string()
        } else {
            format!(
                "unexpected local results: action {:?}, budget {:?}",
                intent.action, intent.budget
            )
        },
    }
}

fn check_remote<E: std::fmt::Display>(
    name: &'static str,
    client: Result<Option<Arc<dyn LlmClient>>, E>,
    timeout_secs: u64,
    disabled_details: &str,
) -> DoctorCheck {
    let client = match client {
        Ok(Some(client)) => client,
        Ok(None) => {
            return DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: disabled_details.to_string(),
            };
        }
        Err(error) => {
            return DoctorCheck {
                name,
                status: CheckStatus::Fail,
                details: format!("failed to build client: {error}"),
            };
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name,
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let params = GenerationParams { temperature: 0.0, max_tokens: 8 };
    let result = runtime.block_on(async {
        let call = client.complete(READY_PROMPT, params);
        tokio::time::timeout(Duration::from_secs(timeout_secs), call).await
    });

    match result {
        Ok(Ok(_)) => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!("{} answered a readiness prompt", client.name()),
        },
        Ok(Err(error)) => DoctorCheck {
            name,
            status: CheckStatus::Fail,
            details: format!("{} readiness check failed: {error}", client.name()),
        },
        Err(_) => DoctorCheck {
            name,
            status: CheckStatus::Fail,
            details: format!("{} readiness check timed out after {timeout_secs}s", client.name()),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
