//! Submission flow and result loaders against a mocked backend.
//!
//! Each test starts its own wiremock server and points the reqwest backend at it.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use workscan::backend::{Backend, HttpBackend};
use workscan::error::SubmitError;
use workscan::flow::{FlowState, Step, SubmissionController, SubmitOutcome};
use workscan::model::{ClientConfig, ReportFormat, TaskDraft, WorkflowDraft, WorkflowId};
use workscan::report::{self, Phase};
use workscan::verification::{NoopVerifier, StaticTokenVerifier};

// =============================================================================
// HELPERS
// =============================================================================

fn backend_for(server: &MockServer) -> Arc<dyn Backend> {
    let cfg = ClientConfig {
        api_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    };
    Arc::new(HttpBackend::new(&cfg).unwrap())
}

fn controller(server: &MockServer) -> SubmissionController {
    SubmissionController::new(backend_for(server), Arc::new(NoopVerifier))
        .with_settle_delay(Duration::ZERO)
}

fn marketing_draft() -> WorkflowDraft {
    WorkflowDraft {
        name: "Marketing".into(),
        // The blank row must not reach the backend.
        tasks: vec![TaskDraft::named("Write posts"), TaskDraft::default()],
        ..WorkflowDraft::default()
    }
}

fn analysis_body(id: i64) -> serde_json::Value {
    json!({
        "id": 7,
        "workflow_id": id,
        "automation_score": 72.4,
        "hours_saved": 104.0,
        "annual_savings": 5200.0,
        "created_at": "2025-03-01T10:00:00",
        "results": [
            {
                "task_id": 1,
                "task_name": "Write posts",
                "ai_readiness_score": 81.0,
                "time_saved_percentage": 60.0,
                "recommendation": "Draft posts with ChatGPT and schedule them in Buffer",
                "difficulty": "easy",
                "estimated_hours_saved": 104.0
            }
        ]
    })
}

async fn mount_create(server: &MockServer, id: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id, "name": "Marketing" })))
        .expect(1)
        .mount(server)
        .await;
}

// =============================================================================
// SUBMISSION
// =============================================================================

#[tokio::test]
async fn submit_success_resolves_with_created_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/workflows"))
        .and(header_exists("x-request-id"))
        .and(body_json(json!({
            "name": "Marketing",
            "description": "",
            "tasks": [{
                "name": "Write posts",
                "description": "Write posts",
                "frequency": "weekly",
                "time_per_task": 30,
                "category": "general",
                "complexity": "medium"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .and(body_json(json!({
            "workflow_id": 42,
            "hourly_rate": 50.0,
            "recaptcha_token": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body(42)))
        .expect(1)
        .mount(&server)
        .await;

    let mut c = controller(&server);
    let outcome = c.submit(&marketing_draft()).await.unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Completed {
            workflow_id: WorkflowId::Int(42)
        }
    );
    assert_eq!(c.progress().completed_steps().len(), Step::COUNT);
    assert_eq!(c.progress().state(), &FlowState::Done);
}

#[tokio::test]
async fn string_ids_are_echoed_back_as_strings() {
    let server = MockServer::start().await;
    mount_create(&server, json!("wf-abc")).await;

    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .and(body_json(json!({
            "workflow_id": "wf-abc",
            "hourly_rate": 50.0,
            "recaptcha_token": "tok-123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body(1)))
        .expect(1)
        .mount(&server)
        .await;

    let mut c = SubmissionController::new(
        backend_for(&server),
        Arc::new(StaticTokenVerifier::new("tok-123")),
    )
    .with_settle_delay(Duration::ZERO);
    let outcome = c.submit(&marketing_draft()).await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Completed {
            workflow_id: WorkflowId::Str("wf-abc".into())
        }
    );
}

#[tokio::test]
async fn rate_limit_freezes_flow_with_server_message() {
    let server = MockServer::start().await;
    mount_create(&server, json!(42)).await;

    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "detail": {
                "error": "rate_limited",
                "message": "Daily limit reached",
                "retry_after_seconds": 3600
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut c = controller(&server);
    let outcome = c.submit(&marketing_draft()).await.unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::RateLimited {
            workflow_id: WorkflowId::Int(42),
            message: "Daily limit reached".into()
        }
    );
    assert_eq!(c.progress().rate_limit_notice(), Some("Daily limit reached"));
    assert!(c.progress().current_step_index() <= Step::RequestAnalysis.index() as i32);
    assert!(!c.progress().is_step_completed(Step::RequestAnalysis));

    // Frozen: a second submit is refused without touching the network (expect(1) above).
    let err = c.submit(&marketing_draft()).await.unwrap_err();
    assert_eq!(err, SubmitError::RateLimitPending);
    assert_eq!(c.progress().rate_limit_notice(), Some("Daily limit reached"));

    assert!(c.dismiss_rate_limit());
    assert_eq!(c.progress().state(), &FlowState::NotStarted);
}

#[tokio::test]
async fn security_rejection_resets_with_specific_message() {
    let server = MockServer::start().await;
    mount_create(&server, json!(42)).await;

    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "detail": "reCAPTCHA verification failed" })))
        .mount(&server)
        .await;

    let mut c = controller(&server);
    let err = c.submit(&marketing_draft()).await.unwrap_err();

    assert_eq!(
        err,
        SubmitError::SecurityCheck("reCAPTCHA verification failed".into())
    );
    assert_eq!(c.progress().state(), &FlowState::NotStarted);
    assert_eq!(
        c.progress().terminal_error(),
        Some("reCAPTCHA verification failed")
    );
}

#[tokio::test]
async fn analysis_failure_without_body_uses_default_message() {
    let server = MockServer::start().await;
    mount_create(&server, json!(42)).await;

    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut c = controller(&server);
    let err = c.submit(&marketing_draft()).await.unwrap_err();
    assert_eq!(err, SubmitError::Analysis("Failed to analyze workflow".into()));
}

#[tokio::test]
async fn invalid_draft_makes_no_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut c = controller(&server);
    let empty = WorkflowDraft {
        name: "".into(),
        tasks: vec![],
        ..WorkflowDraft::default()
    };
    let err = c.submit(&empty).await.unwrap_err();
    assert!(matches!(err, SubmitError::Validation(_)));

    let unnamed_tasks = WorkflowDraft {
        name: "Ops".into(),
        tasks: vec![TaskDraft::named("  "), TaskDraft::default()],
        ..WorkflowDraft::default()
    };
    let err = c.submit(&unnamed_tasks).await.unwrap_err();
    assert!(matches!(err, SubmitError::Validation(_)));
    assert_eq!(c.progress().state(), &FlowState::NotStarted);
}

// =============================================================================
// RESULT VIEWS
// =============================================================================

#[tokio::test]
async fn results_view_falls_back_to_generic_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/results/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body(42)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/workflows/42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Workflow not found" })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let view = report::load_results(backend.as_ref(), &WorkflowId::Int(42))
        .await
        .unwrap();
    assert_eq!(view.workflow_name, report::FALLBACK_WORKFLOW_NAME);
    assert_eq!(view.total_tasks(), 1);
    assert_eq!(view.automation_ready(), 1);

    let roadmap = report::build_roadmap(&view.analysis);
    let quick = roadmap.phase(Phase::QuickWins);
    assert_eq!(quick.len(), 1);
    assert_eq!(quick[0].tools, ["buffer", "chatgpt"]);
}

#[tokio::test]
async fn dashboard_lists_orphans_without_analysis() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Old", "created_at": "2025-01-01T09:00:00", "tasks": [{"name": "a"}] },
            { "id": 2, "name": "Orphan", "created_at": "2025-02-01T09:00:00", "tasks": [] }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/results/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body(1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/results/2"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "No analysis" })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let dash = report::load_dashboard(backend.as_ref()).await.unwrap();

    assert_eq!(dash.entries.len(), 2);
    assert_eq!(dash.entries[0].name, "Orphan");
    assert!(!dash.entries[0].is_analyzed());
    assert_eq!(dash.totals.analyzed, 1);
    assert_eq!(dash.totals.average_score, Some(72));
    assert_eq!(dash.totals.total_hours_saved, 104.0);
}

#[tokio::test]
async fn export_writes_report_bytes() {
    let server = MockServer::start().await;
    let pdf = b"%PDF-1.7 fake".to_vec();

    Mock::given(method("GET"))
        .and(path("/api/reports/42/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("reports").join("q1.pdf");
    let backend = backend_for(&server);
    let (written, n) = workscan::export::export_report(
        backend.as_ref(),
        &WorkflowId::Int(42),
        ReportFormat::Pdf,
        Some(&out),
    )
    .await
    .unwrap();

    assert_eq!(written, out);
    assert_eq!(n, pdf.len());
    assert_eq!(std::fs::read(&out).unwrap(), pdf);
}

#[tokio::test]
async fn extractor_output_fills_the_draft() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/parse-tasks"))
        .and(body_json(json!({ "text": "Every day I answer support email" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "workflow_name": "Support",
            "tasks": [
                { "name": "Answer email", "frequency": "daily", "time_per_task": 20,
                  "category": "communication", "complexity": "low" },
                { "name": "Tag tickets", "category": "something_new" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let mut draft = WorkflowDraft::default();
    let n = workscan::intake::from_text(
        backend.as_ref(),
        &mut draft,
        "Every day I answer support email",
    )
    .await
    .unwrap();

    assert_eq!(n, 2);
    assert_eq!(draft.name, "Support");
    assert_eq!(draft.tasks[0].time_per_task, 20);
    // Unknown values fall back to defaults.
    assert_eq!(draft.tasks[1].category, workscan::model::Category::General);
    assert_eq!(draft.tasks[1].time_per_task, 30);
}
