//! Integration tests for manual prescription entry and action reconciliation.
//!
//! The manual form and the chat flow share one action executor, so both
//! paths end in the same repository and journal.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use clinic_assistant::adapters::http::{api_router, PrescriptionAppState, WhatsappAppState};
use clinic_assistant::adapters::memory::{
    InMemoryActionJournal, InMemoryAppointmentRepository, InMemoryConversationStore,
    InMemoryPrescriptionRepository, LoggingGateway,
};
use clinic_assistant::application::handlers::action::{
    DomainActionExecutor, ReconcileConfig, ReconcilePendingActions,
};
use clinic_assistant::application::handlers::conversation::HandleInboundMessageHandler;
use clinic_assistant::application::handlers::prescription::CreatePrescriptionHandler;
use clinic_assistant::domain::clinic::ActionKey;
use clinic_assistant::domain::conversation::{
    ConversationState, FlowContext, FlowStep, Identity, Intent,
};
use clinic_assistant::domain::foundation::{ClientId, Timestamp};
use clinic_assistant::ports::{ActionJournal, PrescriptionRepository};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    store: Arc<InMemoryConversationStore>,
    journal: Arc<InMemoryActionJournal>,
    prescriptions: Arc<InMemoryPrescriptionRepository>,
    reconciler: ReconcilePendingActions,
    app: Router,
}

fn harness() -> Harness {
    let journal = Arc::new(InMemoryActionJournal::new());
    let store = Arc::new(InMemoryConversationStore::with_journal(journal.clone()));
    let prescriptions = Arc::new(InMemoryPrescriptionRepository::new());
    let flow = FlowContext {
        doctor_name: "Dra. Ana Souza".to_string(),
        doctor_crm: "CRM-SP 123456".to_string(),
    };
    let executor = Arc::new(DomainActionExecutor::new(
        journal.clone(),
        prescriptions.clone(),
        Arc::new(InMemoryAppointmentRepository::new()),
    ));

    let inbound = Arc::new(HandleInboundMessageHandler::new(
        store.clone(),
        executor.clone(),
        Arc::new(LoggingGateway),
        flow.clone(),
        5,
    ));
    let manual = Arc::new(CreatePrescriptionHandler::new(executor.clone(), flow.clone()));
    let reconciler = ReconcilePendingActions::new(
        store.clone(),
        journal.clone(),
        executor,
        flow,
        ReconcileConfig {
            interval: Duration::from_secs(60),
            grace: Duration::from_secs(30),
            batch_size: 10,
        },
    );

    let app = api_router(
        WhatsappAppState::new(inbound),
        PrescriptionAppState::new(manual),
        &["https://clinic.example".to_string()],
        Duration::from_secs(30),
    );

    Harness {
        store,
        journal,
        prescriptions,
        reconciler,
        app,
    }
}

async fn post_prescription(app: &Router, client_id: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/clients/{}/prescription", client_id))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

// =============================================================================
// Manual entry
// =============================================================================

#[tokio::test]
async fn empty_medications_never_reach_the_executor() {
    let h = harness();

    let (status, body) = post_prescription(
        &h.app,
        "client-1",
        json!({
            "medications": "",
            "instructions": "",
            "issueDate": "2024-06-01",
            "doctorName": "Dr. João",
            "doctorCrm": "CRM-RJ 1"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(h.prescriptions.count().await, 0);
    assert!(h.journal.is_empty().await);
}

#[tokio::test]
async fn empty_issue_date_is_rejected() {
    let h = harness();

    let (status, _) = post_prescription(
        &h.app,
        "client-1",
        json!({ "medications": "Dipirona", "issueDate": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.prescriptions.count().await, 0);
}

#[tokio::test]
async fn valid_form_creates_record_for_client() {
    let h = harness();

    let (status, body) = post_prescription(
        &h.app,
        "client-9",
        json!({
            "medications": "Amoxicilina 500mg",
            "instructions": "8 em 8h por 7 dias",
            "issueDate": "2024-06-01",
            "doctorName": "Dr. João Lima",
            "doctorCrm": "CRM-RJ 654321"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["prescription"]["doctorName"], "Dr. João Lima");

    let client = ClientId::new("client-9").unwrap();
    let records = h.prescriptions.find_by_client(&client).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].instructions, "8 em 8h por 7 dias");
    assert_eq!(h.journal.len().await, 1);
}

#[tokio::test]
async fn each_submission_is_a_separate_record() {
    let h = harness();
    let form = json!({ "medications": "Dipirona", "issueDate": "2024-06-01" });

    post_prescription(&h.app, "client-1", form.clone()).await;
    post_prescription(&h.app, "client-1", form).await;

    assert_eq!(h.prescriptions.count().await, 2);
}

// =============================================================================
// Reconciliation
// =============================================================================

#[tokio::test]
async fn committed_but_unexecuted_action_is_reconciled_once() {
    let h = harness();
    let identity = Identity::parse("+551188887777").unwrap();
    let mut slots = BTreeMap::new();
    slots.insert("medications".to_string(), "Losartana 50mg".to_string());
    slots.insert("issueDate".to_string(), "2024-06-01".to_string());
    slots.insert("instructions".to_string(), "1x ao dia".to_string());
    h.store
        .put(ConversationState {
            identity: identity.clone(),
            step: FlowStep::TerminalSuccess {
                intent: Intent::Prescription,
            },
            slots,
            updated_at: Timestamp::now().minus_secs(300),
            version: 4,
        })
        .await;

    let first = h.reconciler.run_once().await.unwrap();
    let second = h.reconciler.run_once().await.unwrap();

    assert_eq!(first.executed, 1);
    assert_eq!(second.executed, 0);
    assert_eq!(h.prescriptions.count().await, 1);
    let key = ActionKey::for_transition(&identity, 4, 0);
    assert!(h.journal.is_completed(&key).await.unwrap());
}

#[tokio::test]
async fn health_endpoint_is_mounted() {
    let h = harness();

    let response = h
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
