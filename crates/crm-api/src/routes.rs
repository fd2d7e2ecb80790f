// ============================================================================
// CRM API - Router
// File: crates/crm-api/src/routes.rs
// ============================================================================
//! Route table of the CRM service

use axum::{
    http::{header, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{agents, auth, categories, leads, password_reset, public};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(public::landing))
        .route("/health", get(public::health_check))
        // Auth
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        // Password reset
        .route("/reset-password", post(password_reset::request_reset))
        .route(
            "/reset-confirm/{uidb64}/{token}",
            get(password_reset::check_link).post(password_reset::confirm_reset),
        )
        // Leads
        .route("/leads", get(leads::list).post(leads::create))
        .route(
            "/leads/{id}",
            get(leads::detail).put(leads::update).delete(leads::delete),
        )
        .route("/leads/{id}/assign", post(leads::assign_agent))
        .route("/leads/{id}/category", put(leads::update_category))
        // Categories
        .route("/leads/categories", get(categories::list).post(categories::create))
        .route(
            "/leads/categories/{id}",
            get(categories::detail).put(categories::rename).delete(categories::delete),
        )
        // Agents
        .route("/agents", get(agents::list).post(agents::create))
        .route(
            "/agents/{id}",
            get(agents::detail).put(agents::update).delete(agents::delete),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crm_core::notifier::Notification;
    use crm_core::testing::{InMemoryStore, RecordingNotifier};

    use crate::state::ApiSettings;

    struct TestApp {
        store: Arc<InMemoryStore>,
        notifier: Arc<RecordingNotifier>,
        router: Router,
    }

    fn settings() -> ApiSettings {
        ApiSettings {
            app_name: "crm-test".to_string(),
            base_url: "http://crm.test".to_string(),
            jwt_secret: "router-test-jwt".to_string(),
            access_token_expiry: 3600,
            reset_secret: "router-test-reset".to_string(),
            password_reset_timeout: 3600,
            login_attempts_per_minute: 3,
            lead_notification_recipients: vec![],
        }
    }

    fn test_app() -> TestApp {
        let store = InMemoryStore::new();
        let notifier = RecordingNotifier::new();
        let state = AppState::new(store.repositories(), notifier.clone(), settings());
        TestApp {
            store,
            notifier,
            router: build_router(state),
        }
    }

    async fn send(app: &TestApp, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(app: &TestApp, username: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_and_landing_are_public() {
        let app = test_app();

        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "healthy");

        let (status, body) = send(&app, "GET", "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "crm-test");
    }

    #[tokio::test]
    async fn test_signup_login_logout() {
        let app = test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/signup",
            None,
            Some(json!({
                "username": "boss",
                "email": "boss@acme.test",
                "password": "c0rrect-horse",
                "password_confirm": "c0rrect-horse"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["role"], "organisor");

        let token = login(&app, "boss", "c0rrect-horse").await;

        let (status, _) = send(&app, "GET", "/leads", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "POST", "/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", "/leads", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signup_rejects_mismatched_passwords_with_field_errors() {
        let app = test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/signup",
            None,
            Some(json!({
                "username": "boss",
                "email": "not-an-email",
                "password": "c0rrect-horse",
                "password_confirm": "something-else"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["fields"]["email"].is_array());
        assert!(body["error"]["fields"]["password_confirm"].is_array());
    }

    #[tokio::test]
    async fn test_leads_require_authentication() {
        let app = test_app();

        let (status, body) = send(&app, "GET", "/leads", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, "GET", "/leads", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_agent_only_sees_own_leads() {
        let app = test_app();
        let (_, org) = app.store.seed_organisor("boss", "c0rrect-horse");
        let (_, other_org) = app.store.seed_organisor("rival", "c0rrect-horse");
        let agent = app.store.seed_agent(org.id, "agent.smith", "s3cret-agent");
        let colleague = app.store.seed_agent(org.id, "agent.jones", "s3cret-agent");

        let own = app.store.seed_lead(org.id, Some(agent.id), None);
        let colleagues = app.store.seed_lead(org.id, Some(colleague.id), None);
        let foreign = app.store.seed_lead(other_org.id, None, None);

        let token = login(&app, "agent.smith", "s3cret-agent").await;

        let (status, body) = send(&app, "GET", "/leads", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let leads = body["data"]["leads"].as_array().unwrap();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0]["id"], own.id.to_string());
        assert!(body["data"].get("unassigned_leads").is_none());

        for id in [colleagues.id, foreign.id] {
            let (status, _) = send(&app, "GET", &format!("/leads/{}", id), Some(&token), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_organisor_cannot_reach_another_organisation() {
        let app = test_app();
        app.store.seed_organisor("boss", "c0rrect-horse");
        let (_, other_org) = app.store.seed_organisor("rival", "c0rrect-horse");
        let foreign_lead = app.store.seed_lead(other_org.id, None, None);
        let foreign_agent = app.store.seed_agent(other_org.id, "their.agent", "s3cret-agent");

        let token = login(&app, "boss", "c0rrect-horse").await;

        let (status, body) = send(&app, "GET", "/leads", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["leads"].as_array().unwrap().is_empty());
        assert!(body["data"]["unassigned_leads"].as_array().unwrap().is_empty());

        let (status, _) = send(&app, "DELETE", &format!("/leads/{}", foreign_lead.id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(app.store.lead(&foreign_lead.id).is_some());

        let (status, _) = send(&app, "GET", &format!("/agents/{}", foreign_agent.id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_agent_is_forbidden_from_agent_management() {
        let app = test_app();
        let (_, org) = app.store.seed_organisor("boss", "c0rrect-horse");
        app.store.seed_agent(org.id, "agent.smith", "s3cret-agent");

        let token = login(&app, "agent.smith", "s3cret-agent").await;

        let (status, body) = send(&app, "GET", "/agents", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        let (status, _) = send(
            &app,
            "POST",
            "/leads",
            Some(&token),
            Some(json!({ "first_name": "Ann", "last_name": "Lee", "age": 30, "email": "ann@lee.test" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_organisor_creates_lead_and_assigns_agent() {
        let app = test_app();
        let (_, org) = app.store.seed_organisor("boss", "c0rrect-horse");
        let agent = app.store.seed_agent(org.id, "agent.smith", "s3cret-agent");
        let token = login(&app, "boss", "c0rrect-horse").await;

        let (status, body) = send(
            &app,
            "POST",
            "/leads",
            Some(&token),
            Some(json!({ "first_name": "Ann", "last_name": "Lee", "age": 30, "email": "ann@lee.test" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["organisation_id"], org.id.to_string());
        let lead_id = body["data"]["id"].as_str().unwrap().to_string();

        assert!(app
            .notifier
            .sent()
            .iter()
            .any(|n| matches!(n, Notification::LeadCreated { to, .. } if to == &vec!["boss@example.com".to_string()])));

        let (status, body) = send(
            &app,
            "POST",
            &format!("/leads/{}/assign", lead_id),
            Some(&token),
            Some(json!({ "agent_id": agent.id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["agent_id"], agent.id.to_string());
    }

    #[tokio::test]
    async fn test_category_routes_are_not_shadowed_by_lead_detail() {
        let app = test_app();
        let (_, org) = app.store.seed_organisor("boss", "c0rrect-horse");
        app.store.seed_lead(org.id, None, None);
        let token = login(&app, "boss", "c0rrect-horse").await;

        let (status, body) = send(
            &app,
            "POST",
            "/leads/categories",
            Some(&token),
            Some(json!({ "name": "Contacted" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["name"], "Contacted");

        let (status, body) = send(&app, "GET", "/leads/categories", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["categories"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["unassigned_lead_count"], 1);
    }

    #[tokio::test]
    async fn test_invalid_lead_id_is_bad_request() {
        let app = test_app();
        app.store.seed_organisor("boss", "c0rrect-horse");
        let token = login(&app, "boss", "c0rrect-horse").await;

        let (status, body) = send(&app, "GET", "/leads/not-a-uuid", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_login_is_throttled_per_username() {
        let app = test_app();
        app.store.seed_organisor("boss", "c0rrect-horse");

        for _ in 0..3 {
            let (status, _) = send(
                &app,
                "POST",
                "/login",
                None,
                Some(json!({ "username": "boss", "password": "wrong-password" })),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let (status, body) = send(
            &app,
            "POST",
            "/login",
            None,
            Some(json!({ "username": "boss", "password": "c0rrect-horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "TOO_MANY_REQUESTS");
    }

    #[tokio::test]
    async fn test_password_reset_always_reports_done() {
        let app = test_app();
        app.store.seed_organisor("boss", "c0rrect-horse");

        for email in ["boss@example.com", "nobody@example.com"] {
            let (status, body) = send(&app, "POST", "/reset-password", None, Some(json!({ "email": email }))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["status"], "done");
        }

        let sent = app.notifier.sent();
        assert_eq!(sent.len(), 1);
        let reset_url = match &sent[0] {
            Notification::PasswordReset { reset_url, .. } => reset_url.clone(),
            other => panic!("unexpected notification {:?}", other),
        };
        let path = reset_url.trim_start_matches("http://crm.test");

        let (status, body) = send(&app, "GET", path, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["valid"], true);

        let (status, body) = send(
            &app,
            "POST",
            path,
            None,
            Some(json!({ "new_password": "n3w-passphrase", "new_password_confirm": "n3w-passphrase" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "complete");

        let (_, body) = send(&app, "GET", path, None, None).await;
        assert_eq!(body["data"]["valid"], false);

        login(&app, "boss", "n3w-passphrase").await;
    }
}
