//! End-to-end integration tests for the Caliper adaptive testing engine.
//!
//! These tests exercise the full pipeline from session start to completion
//! report, including item selection, ability estimation, stopping rules,
//! persistence, and the HTTP gateway.

use std::sync::Arc;

use caliper_bank::{InMemoryBank, demo_bank};
use caliper_config::{AppConfig, EstimatorConfig};
use caliper_core::bank::ItemBank;
use caliper_core::event::EventBus;
use caliper_core::item::Item;
use caliper_core::session::{AssessmentSettings, CompletionReason, SessionState};
use caliper_engine::{Next, Orchestrator, SettingsOverrides, StartOutcome};
use caliper_gateway::{AppState, build_router};
use caliper_store::{FileStore, InMemoryStore};
use caliper_telemetry::TelemetryEngine;

// ── Helpers ──────────────────────────────────────────────────────────────

fn item(id: &str, a: f64, b: f64) -> Item {
    Item {
        id: id.into(),
        a,
        b,
        c: None,
        concept_tag: "t".into(),
        content_category: "math".into(),
        prompt: format!("prompt {id}"),
        answer_key: "yes".into(),
        exposure_count: 0,
    }
}

/// A bank with difficulties spread across the ability scale.
fn spread_bank(n: usize) -> Arc<dyn ItemBank> {
    let items = (0..n)
        .map(|i| {
            item(
                &format!("i{i:03}"),
                1.0 + (i % 4) as f64 * 0.25,
                -3.0 + i as f64 * (6.0 / n as f64),
            )
        })
        .collect();
    Arc::new(InMemoryBank::new(items).unwrap())
}

fn settings(min: usize, max: usize, target_se: f64) -> AssessmentSettings {
    AssessmentSettings {
        min_items: min,
        max_items: max,
        target_se,
        ..AssessmentSettings::default()
    }
}

fn orchestrator(bank: Arc<dyn ItemBank>, settings: AssessmentSettings) -> Orchestrator {
    Orchestrator::new(
        bank,
        Arc::new(InMemoryStore::new()),
        Arc::new(EventBus::default()),
        settings,
        EstimatorConfig::default(),
    )
}

/// Drive a session to completion with a fixed answer.
async fn run_to_completion(
    orch: &Orchestrator,
    outcome: StartOutcome,
    answer: &str,
) -> (String, CompletionReason) {
    let session_id = outcome.session.id.to_string();
    let mut next = outcome.next;
    loop {
        match next {
            Next::Item(view) => {
                let out = orch
                    .respond(&session_id, &view.id, answer, 800)
                    .await
                    .expect("respond should succeed");
                next = out.next;
            }
            Next::Report(report) => return (session_id, report.reason),
        }
    }
}

// ── E2E: stopping rules and session limits ───────────────────────────────

#[tokio::test]
async fn e2e_session_never_exceeds_item_cap() {
    // Precision target is unreachable, so only the cap can stop the session.
    let orch = orchestrator(spread_bank(40), settings(2, 6, 0.0001));
    let out = orch
        .start("learner-1", None, SettingsOverrides::default())
        .await
        .unwrap();

    let (session_id, reason) = run_to_completion(&orch, out, "yes").await;
    assert_eq!(reason, CompletionReason::ItemCapReached);

    let session = orch.status(&session_id).await.unwrap();
    assert_eq!(session.administered.len(), 6);
    assert_eq!(session.responses.len(), 6);
}

#[tokio::test]
async fn e2e_no_item_is_administered_twice() {
    let orch = orchestrator(spread_bank(16), settings(1, 16, 0.0001));
    let out = orch
        .start("learner-1", None, SettingsOverrides::default())
        .await
        .unwrap();

    let (session_id, _) = run_to_completion(&orch, out, "yes").await;
    let session = orch.status(&session_id).await.unwrap();

    let mut seen = session.administered.clone();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), session.administered.len());
}

#[tokio::test]
async fn e2e_min_items_floor_holds_before_precision() {
    // The target SE is absurdly loose — met before the first item — yet the
    // session must still run min_items before the precision rule can fire.
    let orch = orchestrator(spread_bank(20), settings(3, 10, 10.0));
    let out = orch
        .start("learner-1", None, SettingsOverrides::default())
        .await
        .unwrap();

    let (session_id, reason) = run_to_completion(&orch, out, "yes").await;
    assert_eq!(reason, CompletionReason::PrecisionReached);

    let session = orch.status(&session_id).await.unwrap();
    assert_eq!(session.administered.len(), 3);
}

#[tokio::test]
async fn e2e_time_budget_stops_after_floor() {
    let orch = orchestrator(
        spread_bank(20),
        AssessmentSettings {
            min_items: 2,
            max_items: 10,
            target_se: 0.0001,
            max_seconds: Some(0),
            ..AssessmentSettings::default()
        },
    );
    let out = orch
        .start("learner-1", None, SettingsOverrides::default())
        .await
        .unwrap();

    let (session_id, reason) = run_to_completion(&orch, out, "yes").await;
    assert_eq!(reason, CompletionReason::TimeBudgetExceeded);

    // The floor still applies to the time budget.
    let session = orch.status(&session_id).await.unwrap();
    assert_eq!(session.administered.len(), 2);
}

#[tokio::test]
async fn e2e_exhausted_bank_forces_completion() {
    // Three items, floor of ten: the bank runs dry first.
    let bank: Arc<dyn ItemBank> = Arc::new(
        InMemoryBank::new(vec![
            item("a", 1.0, -1.0),
            item("b", 1.0, 0.0),
            item("c", 1.0, 1.0),
        ])
        .unwrap(),
    );
    let orch = orchestrator(bank, settings(10, 30, 0.3));
    let out = orch
        .start("learner-1", None, SettingsOverrides::default())
        .await
        .unwrap();

    let (session_id, reason) = run_to_completion(&orch, out, "yes").await;
    assert_eq!(reason, CompletionReason::BankExhausted);

    let session = orch.status(&session_id).await.unwrap();
    assert_eq!(session.administered.len(), 3);
    assert!(session.is_completed());
}

// ── E2E: estimation behavior ─────────────────────────────────────────────

#[tokio::test]
async fn e2e_first_item_maximizes_information_at_prior() {
    // At the prior θ = 0, the b = 0 item with the highest discrimination
    // carries the most Fisher information.
    let bank: Arc<dyn ItemBank> = Arc::new(
        InMemoryBank::new(vec![
            item("easy", 1.0, -2.0),
            item("sharp-mid", 2.0, 0.0),
            item("dull-mid", 0.8, 0.1),
            item("hard", 1.0, 2.0),
        ])
        .unwrap(),
    );
    let orch = orchestrator(bank, settings(1, 4, 0.3));
    let out = orch
        .start("learner-1", None, SettingsOverrides::default())
        .await
        .unwrap();

    match out.next {
        Next::Item(view) => assert_eq!(view.id, "sharp-mid"),
        Next::Report(_) => panic!("expected a first item"),
    }
}

#[tokio::test]
async fn e2e_all_correct_pegs_theta_at_upper_bound() {
    let orch = orchestrator(spread_bank(20), settings(2, 8, 0.0001));
    let out = orch
        .start("learner-1", None, SettingsOverrides::default())
        .await
        .unwrap();

    let (session_id, _) = run_to_completion(&orch, out, "yes").await;
    let session = orch.status(&session_id).await.unwrap();
    assert_eq!(session.theta, session.settings.theta_max);
    assert!(session.is_completed());
}

#[tokio::test]
async fn e2e_all_incorrect_pegs_theta_at_lower_bound() {
    let orch = orchestrator(spread_bank(20), settings(2, 8, 0.0001));
    let out = orch
        .start("learner-1", None, SettingsOverrides::default())
        .await
        .unwrap();

    let (session_id, _) = run_to_completion(&orch, out, "wrong").await;
    let session = orch.status(&session_id).await.unwrap();
    assert_eq!(session.theta, session.settings.theta_min);
}

#[tokio::test]
async fn e2e_standard_error_shrinks_with_evidence() {
    let orch = orchestrator(spread_bank(30), settings(2, 12, 0.0001));
    let out = orch
        .start("learner-1", None, SettingsOverrides::default())
        .await
        .unwrap();
    let session_id = out.session.id.to_string();

    let prior_se = out.session.standard_error;
    let mut next = out.next;
    let mut answer_correct = true;
    let mut final_se = prior_se;
    while let Next::Item(view) = next {
        // Alternate answers so θ stays interior and information accumulates.
        let out = orch
            .respond(
                &session_id,
                &view.id,
                if answer_correct { "yes" } else { "no" },
                500,
            )
            .await
            .unwrap();
        answer_correct = !answer_correct;
        final_se = out.standard_error;
        next = out.next;
    }

    assert!(
        final_se < prior_se,
        "final SE {final_se} should be below the prior {prior_se}"
    );
}

// ── E2E: persistence fidelity ────────────────────────────────────────────

#[tokio::test]
async fn e2e_completed_session_survives_store_reopen() {
    let tmp = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().to_path_buf();

    let store = Arc::new(FileStore::new(dir.clone()));
    let orch = Orchestrator::new(
        spread_bank(20),
        store,
        Arc::new(EventBus::default()),
        settings(1, 4, 0.0001),
        EstimatorConfig::default(),
    );
    let out = orch
        .start("learner-1", None, SettingsOverrides::default())
        .await
        .unwrap();
    let (session_id, _) = run_to_completion(&orch, out, "yes").await;
    let live = orch.status(&session_id).await.unwrap();

    // Reload through a fresh store handle, as a restarted process would.
    let reopened = FileStore::new(dir);
    let stored = {
        use caliper_core::store::SessionStore;
        reopened.load(&session_id).await.unwrap().unwrap()
    };
    assert_eq!(stored.theta, live.theta);
    assert_eq!(stored.standard_error, live.standard_error);
    assert_eq!(stored.responses.len(), live.responses.len());
    assert_eq!(stored.administered, live.administered);
    assert_eq!(stored.completion, live.completion);
    assert_eq!(stored.state, SessionState::Completed);
}

// ── E2E: HTTP gateway flow ───────────────────────────────────────────────

mod http {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> axum::Router {
        let config = AppConfig::default();
        let telemetry = Arc::new(TelemetryEngine::new());
        let orchestrator = Arc::new(
            Orchestrator::new(
                Arc::new(demo_bank()),
                Arc::new(InMemoryStore::new()),
                Arc::new(EventBus::default()),
                config.assessment.settings(),
                config.estimator.clone(),
            )
            .with_telemetry(telemetry.clone()),
        );
        build_router(Arc::new(AppState {
            orchestrator,
            telemetry,
            store_backend: "memory".into(),
            start_time: chrono::Utc::now(),
        }))
    }

    async fn post(app: &axum::Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn e2e_http_full_assessment_flow() {
        let app = app();

        let (status, start) = post(
            &app,
            "/v1/assessment/start",
            serde_json::json!({"user_id": "learner-1", "min_items": 2, "max_items": 5, "target_se": 0.0001}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let session_id = start["session_id"].as_str().unwrap().to_string();
        let mut next = start["next"].clone();
        let mut administered = Vec::new();

        // Answer every item correctly ("42" keys the whole demo bank).
        let report = loop {
            match next["kind"].as_str().unwrap() {
                "item" => {
                    let item_id = next["item"]["id"].as_str().unwrap().to_string();
                    administered.push(item_id.clone());
                    let (status, body) = post(
                        &app,
                        &format!("/v1/assessment/{session_id}/respond"),
                        serde_json::json!({"item_id": item_id, "answer": "42", "response_time_ms": 650}),
                    )
                    .await;
                    assert_eq!(status, StatusCode::OK);
                    assert_eq!(body["correct"], true);
                    next = body["next"].clone();
                }
                "report" => break next["report"].clone(),
                other => panic!("unexpected next kind: {other}"),
            }
        };

        assert_eq!(report["reason"], "item_cap_reached");
        assert_eq!(report["items_administered"], 5);
        assert_eq!(administered.len(), 5);

        // No duplicates over the wire either.
        let mut unique = administered.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), administered.len());

        // Status reflects the terminal state and is idempotent.
        for _ in 0..2 {
            let req = Request::builder()
                .uri(format!("/v1/assessment/{session_id}"))
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["state"], "completed");
            assert_eq!(body["completion"], "item_cap_reached");
            assert_eq!(body["items_administered"], 5);
        }
    }

    #[tokio::test]
    async fn e2e_http_closed_session_conflict() {
        let app = app();

        let (_, start) = post(
            &app,
            "/v1/assessment/start",
            serde_json::json!({"user_id": "learner-1", "min_items": 1, "max_items": 1}),
        )
        .await;
        let session_id = start["session_id"].as_str().unwrap();
        let item_id = start["next"]["item"]["id"].as_str().unwrap();

        let (status, body) = post(
            &app,
            &format!("/v1/assessment/{session_id}/respond"),
            serde_json::json!({"item_id": item_id, "answer": "42"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["next"]["kind"], "report");

        let (status, body) = post(
            &app,
            &format!("/v1/assessment/{session_id}/respond"),
            serde_json::json!({"item_id": item_id, "answer": "42"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("no further responses"));
    }
}
