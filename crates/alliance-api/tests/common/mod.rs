//! Common test utilities and harness for API integration tests.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{HeaderMap, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use alliance_api::{AppState, Server, SimulationService};
use alliance_auth::{StaticAuthenticator, SupabaseJwtValidator, TokenValidator};
use alliance_core::{MemoryStore, Profile, Role, Store};
use alliance_llm::MockLlmProvider;

/// Secret shared by the authenticator and the token validator.
pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Frontend origin allowed by CORS.
pub const ORIGIN: &str = "http://localhost:5173";

/// Password of every test account.
pub const PASSWORD: &str = "osteo2026";

/// What the scripted patient always answers.
pub const PATIENT_REPLY: &str = "J'ai mal au bas du dos depuis trois jours.";

/// A well-formed evaluator reply.
pub const FEEDBACK_JSON: &str = r#"```json
{
    "language": "fr",
    "student_facing": {
        "strengths": ["Accueil chaleureux", "Questions ouvertes", "Écoute attentive"],
        "areas_to_improve": ["Reformuler", "Explorer le vécu", "Conclure clairement"],
        "reflective_question": "Qu'auriez-vous pu demander sur son sommeil ?"
    },
    "internal_scores": {"empathy": 4, "structure": 3, "alliance": 5},
    "skill_indicators": {"active_listening": true, "reformulation": false, "emotional_validation": true, "open_questions": true, "structure_clarity": false},
    "kpis": {"open_questions_ratio": 0.5}
}
```"#;

/// A signed-in account.
pub struct TestUser {
    /// User ID
    pub id: Uuid,
    /// Login email
    pub email: &'static str,
    /// Bearer token
    pub token: String,
}

/// Test harness for integration tests.
///
/// Holds the router together with the store and mock models behind it, so
/// tests can drive HTTP calls and inspect or script what happens underneath.
pub struct TestHarness {
    /// Backing store
    pub store: Arc<MemoryStore>,
    /// Mock patient model
    pub patient: Arc<MockLlmProvider>,
    /// Mock evaluator model
    pub evaluator: Arc<MockLlmProvider>,
    /// A student account with a profile
    pub student: TestUser,
    /// An admin account
    pub admin: TestUser,
    router: Router,
}

impl TestHarness {
    /// Creates a harness with one student and one admin.
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let patient = Arc::new(MockLlmProvider::with_response(PATIENT_REPLY));
        let evaluator = Arc::new(MockLlmProvider::with_response(FEEDBACK_JSON));

        let (student_id, admin_id) = (Uuid::new_v4(), Uuid::new_v4());
        let mut admin_profile = Profile::new_student(admin_id, Some("admin@alliance.fr".into()));
        admin_profile.role = Role::Admin;
        store.insert_profile(&admin_profile).await.unwrap();

        let authenticator = StaticAuthenticator::new(JWT_SECRET)
            .with_user(student_id, "etudiant@alliance.fr", PASSWORD)
            .with_user(admin_id, "admin@alliance.fr", PASSWORD);
        let student = TestUser {
            id: student_id,
            email: "etudiant@alliance.fr",
            token: authenticator
                .issue_token(student_id, Some("etudiant@alliance.fr"))
                .unwrap(),
        };
        let admin = TestUser {
            id: admin_id,
            email: "admin@alliance.fr",
            token: authenticator
                .issue_token(admin_id, Some("admin@alliance.fr"))
                .unwrap(),
        };

        let simulation = SimulationService::new(store.clone(), patient.clone(), evaluator.clone());
        let state = AppState::new(store.clone(), Arc::new(authenticator), simulation);
        let validator: Arc<dyn TokenValidator> = Arc::new(SupabaseJwtValidator::new(JWT_SECRET));
        let router = Server::new(state, validator, ORIGIN)
            .unwrap()
            .with_debug_routes(true)
            .router();

        Self {
            store,
            patient,
            evaluator,
            student,
            admin,
            router,
        }
    }

    /// Sends a request and returns status, headers and raw body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    /// Sends a JSON request and decodes the JSON answer.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = self.send(request(method, uri, token, body)).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// GET as `token`.
    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    /// POST a JSON body as `token`.
    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    /// The student's session with `number`, seeding the program if needed.
    pub async fn student_session(&self, number: u8) -> Uuid {
        let (_, dashboard) = self.get("/student/dashboard", &self.student.token).await;
        let id = dashboard["sessions"][usize::from(number) - 1]["id"]
            .as_str()
            .unwrap();
        id.parse().unwrap()
    }

    /// Chats once in session 1, ends it and generates its feedback.
    pub async fn evaluated_first_session(&self) -> Uuid {
        let id = self.student_session(1).await;
        let token = &self.student.token;
        let (status, _) = self
            .post(
                &format!("/student/sessions/{id}/chat"),
                token,
                serde_json::json!({ "message": "Bonjour, qu'est-ce qui vous amène ?" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = self
            .call(Method::POST, &format!("/student/sessions/{id}/end"), Some(token.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = self
            .call(
                Method::POST,
                &format!("/student/sessions/{id}/generate-feedback"),
                Some(token.as_str()),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        id
    }
}

/// Builds a request with an optional bearer token and JSON body.
pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
