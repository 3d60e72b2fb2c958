use std::env;
use std::sync::{Mutex, OnceLock};

use rust_decimal::Decimal;
use serde_json::Value;
use whispercart_cli::commands::{compare, config, doctor, intent, message, offers, ProductArgs};

#[test]
fn intent_returns_structured_record() {
    let result = intent::run("show me running shoes under ₹3000, need them urgently");
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "intent");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["data"]["action"], "search");
    assert_eq!(payload["data"]["budget"], "3000");
}

#[test]
fn intent_rejects_blank_text() {
    let result = intent::run("   ");
    assert_eq!(result.exit_code, 2);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "invalid_input");
}

#[test]
fn offers_returns_plan_with_every_strategy() {
    let result = offers::run(&product(Decimal::new(1999, 0)), Some("friendly"));
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "offers");
    assert_eq!(payload["data"]["strategies"].as_array().map(Vec::len), Some(5));
    assert_eq!(payload["data"]["recommended"]["strategy"], "friendly");
    assert_eq!(payload["data"]["offers"]["source"], "heuristic");
}

#[test]
fn offers_rejects_negative_price() {
    let result = offers::run(&product(Decimal::new(-10, 0)), None);
    assert_eq!(result.exit_code, 2);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "offers");
    assert_eq!(payload["error_class"], "invalid_input");
}

#[test]
fn message_defaults_to_moderate_strategy() {
    let result = message::run(&product(Decimal::new(1999, 0)), Some("lowball"));
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["subject"], "Price inquiry for: Boat Rockerz 450");
    assert!(payload["data"]["body"].as_str().is_some_and(|body| !body.is_empty()));
    assert!(payload["data"]["followUp"].is_string());
}

#[test]
fn compare_requires_two_to_three_listings() {
    let ok = compare::run(
        r#"[{"title": "Boat Rockerz 450", "price": 1499, "rating": 4.1},
            {"title": "JBL Tune 510BT", "price": 2999, "rating": 4.4}]"#,
    );
    assert_eq!(ok.exit_code, 0);
    let payload = parse_payload(&ok.output);
    assert!(payload["data"]["analysis"].as_str().is_some_and(|text| !text.is_empty()));

    let single = compare::run(r#"[{"title": "Only One", "price": 999}]"#);
    assert_eq!(single.exit_code, 2);

    let garbage = compare::run("not json");
    assert_eq!(garbage.exit_code, 2);
    assert_eq!(parse_payload(&garbage.output)["error_class"], "invalid_input");
}

#[test]
fn config_attributes_env_sources_and_redacts_keys() {
    let vars = [("WHISPERCART_SERVER_PORT", "4100"), ("HUGGINGFACE_API_TOKEN", "hf_secretvalue")];
    with_env(&vars, || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let port = field(&payload, "server.port");
        assert_eq!(port["value"], "4100");
        assert_eq!(port["source"], "env (WHISPERCART_SERVER_PORT)");

        let api_key = field(&payload, "llm.api_key");
        assert_eq!(api_key["value"], "hf_***");
        assert_eq!(api_key["source"], "env (HUGGINGFACE_API_TOKEN)");
        assert!(!result.output.contains("secretvalue"));

        assert_eq!(field(&payload, "logging.level")["source"], "default");
    });
}

#[test]
fn config_reports_validation_failure() {
    with_env(&[("WHISPERCART_SERVER_PORT", "not-a-port")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_passes_without_remote_models() {
    with_env(&[], || {
        let report: Value =
            serde_json::from_str(&doctor::run(true)).expect("doctor output should be JSON");
        assert_eq!(report["overall_status"], "pass");

        let status_of = |name: &str| {
            report["checks"]
                .as_array()
                .and_then(|checks| checks.iter().find(|check| check["name"] == name))
                .map(|check| check["status"].clone())
        };
        assert_eq!(status_of("local_engine"), Some(Value::from("pass")));
        assert_eq!(status_of("config_validation"), Some(Value::from("pass")));
        assert_eq!(status_of("remote_model"), Some(Value::from("skipped")));
        assert_eq!(status_of("offer_polish"), Some(Value::from("skipped")));
    });
}

#[test]
fn doctor_human_output_marks_config_failure() {
    with_env(&[("WHISPERCART_LOGGING_FORMAT", "xml")], || {
        let output = doctor::run(false);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation:"));
        assert!(output.contains("- [skip] remote_model:"));
    });
}

fn product(price: Decimal) -> ProductArgs {
    ProductArgs {
        title: Some("Boat Rockerz 450".to_string()),
        price,
        rating: Some(4.1),
        reviews: Some(1200),
        ..ProductArgs::default()
    }
}

fn field<'a>(payload: &'a Value, key: &str) -> &'a Value {
    payload["data"]["fields"]
        .as_array()
        .and_then(|fields| fields.iter().find(|field| field["key"] == key))
        .expect("config field should be reported")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "WHISPERCART_LLM_PROVIDER",
        "WHISPERCART_LLM_API_KEY",
        "WHISPERCART_LLM_BASE_URL",
        "WHISPERCART_LLM_MODEL",
        "WHISPERCART_LLM_TIMEOUT_SECS",
        "WHISPERCART_LLM_MAX_NEW_TOKENS",
        "HUGGINGFACE_API_TOKEN",
        "WHISPERCART_POLISH_API_KEY",
        "WHISPERCART_POLISH_BASE_URL",
        "WHISPERCART_POLISH_MODEL",
        "WHISPERCART_POLISH_TIMEOUT_SECS",
        "WHISPERCART_POLISH_MAX_TOKENS",
        "OPENAI_API_KEY",
        "WHISPERCART_SERVER_BIND_ADDRESS",
        "WHISPERCART_SERVER_PORT",
        "WHISPERCART_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "WHISPERCART_LOGGING_LEVEL",
        "WHISPERCART_LOGGING_FORMAT",
        "WHISPERCART_LOG_LEVEL",
        "WHISPERCART_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
