#![cfg(feature = "document")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use peeth::storage::document::DocumentStore;
use peeth::{create_app, AppState};
use peeth_auth::AuthConfig;
use peeth_core::auth::{self, OtpSender};
use peeth_core::users::Role;

/// Remembers the last code per email.
#[derive(Default)]
struct Inbox {
    codes: Mutex<HashMap<String, String>>,
}

impl Inbox {
    fn code_for(&self, email: &str) -> String {
        self.codes.lock().unwrap().get(email).cloned().unwrap()
    }
}

#[async_trait]
impl OtpSender for Inbox {
    async fn send_code(&self, email: &str, code: &str) -> auth::Result<()> {
        self.codes
            .lock()
            .unwrap()
            .insert(email.to_string(), code.to_string());
        Ok(())
    }
}

struct TestApp {
    app: Router,
    state: AppState,
    inbox: Arc<Inbox>,
}

impl TestApp {
    async fn new() -> Self {
        let inbox = Arc::new(Inbox::default());
        let storage = DocumentStore::open_in_memory().await.unwrap();
        let mut config = AuthConfig::new("integration-secret");
        config.otp_cooldown = std::time::Duration::ZERO;

        let state = AppState::new(Arc::new(storage), config, inbox.clone());
        Self {
            app: create_app(state.clone()),
            state,
            inbox,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Full OTP login; returns the session token.
    async fn login(&self, email: &str) -> String {
        let (status, _) = self
            .call("POST", "/auth/otp/request", None, json!({ "email": email }))
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let code = self.inbox.code_for(email);
        let (status, body) = self
            .call(
                "POST",
                "/auth/otp/verify",
                None,
                json!({ "email": email, "code": code }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    /// Logs in, then gives the user `role` directly through the service.
    async fn login_as(&self, email: &str, role: Role) -> String {
        let token = self.login(email).await;
        let (_, me) = self.get("/auth/me", Some(&token)).await;
        let id = me["id"].as_str().unwrap().parse().unwrap();
        self.state.users.update_role(id, role).await.unwrap();
        token
    }
}

#[tokio::test]
async fn otp_code_works_once() {
    let app = TestApp::new().await;

    app.call(
        "POST",
        "/auth/otp/request",
        None,
        json!({ "email": "seva@peeth.org" }),
    )
    .await;
    let code = app.inbox.code_for("seva@peeth.org");
    let verify = json!({ "email": "seva@peeth.org", "code": code });

    let (first, body) = app.call("POST", "/auth/otp/verify", None, verify.clone()).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(body["user"]["role"], "user");

    let (second, _) = app.call("POST", "/auth/otp/verify", None, verify).await;
    assert_eq!(second, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_codes_void_the_challenge() {
    let app = TestApp::new().await;
    app.call(
        "POST",
        "/auth/otp/request",
        None,
        json!({ "email": "guess@peeth.org" }),
    )
    .await;
    let code = app.inbox.code_for("guess@peeth.org");
    let wrong = if code == "999999" { "000000" } else { "999999" };

    let max = app.state.auth.config().otp_max_attempts;
    for _ in 0..max {
        let (status, _) = app
            .call(
                "POST",
                "/auth/otp/verify",
                None,
                json!({ "email": "guess@peeth.org", "code": wrong }),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = app
        .call(
            "POST",
            "/auth/otp/verify",
            None,
            json!({ "email": "guess@peeth.org", "code": code }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn editors_write_public_reads_published_only() {
    let app = TestApp::new().await;
    let member = app.login("member@peeth.org").await;
    let editor = app.login_as("editor@peeth.org", Role::ContentEditor).await;

    let article = json!({
        "slug": "guru-purnima",
        "contentType": "article",
        "title": { "en": "Guru Purnima" },
        "body": { "en": "..." }
    });

    let (status, _) = app.call("POST", "/api/content", Some(&member), article.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.call("POST", "/api/content", Some(&editor), article).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    // Drafts are invisible to the public.
    let (status, _) = app.get("/api/content/slug/guru-purnima", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listing) = app.get("/api/content", None).await;
    assert_eq!(listing["items"].as_array().unwrap().len(), 0);
    let (status, _) = app.get(&format!("/api/content/{id}"), Some(&editor)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call("POST", &format!("/api/content/{id}/publish"), Some(&editor), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/content/slug/guru-purnima", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "published");

    // Deleting needs admin.
    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/content/{id}"))
        .header(header::AUTHORIZATION, format!("Bearer {editor}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(delete).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cms_page_lifecycle_over_http() {
    let app = TestApp::new().await;
    let admin = app.login_as("admin@peeth.org", Role::Admin).await;

    let (status, page) = app
        .call(
            "POST",
            "/api/cms/pages",
            Some(&admin),
            json!({ "slug": "home", "title": { "en": "Home" }, "published": true }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let page_id = page["id"].as_str().unwrap().to_string();

    for order in 0..3 {
        let (status, _) = app
            .call(
                "POST",
                &format!("/api/cms/pages/{page_id}/components"),
                Some(&admin),
                json!({ "componentType": "text_block", "displayOrder": order }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.get("/api/cms/pages/slug/home", None).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<u64> = body["components"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["displayOrder"].as_u64().unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1, 2]);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/cms/pages/{page_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/cms/pages/{page_id}/components"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_super_admins_change_roles() {
    let app = TestApp::new().await;
    let admin = app.login_as("admin@peeth.org", Role::Admin).await;
    let root = app.login_as("root@peeth.org", Role::SuperAdmin).await;

    let (status, user) = app
        .call(
            "POST",
            "/api/users",
            Some(&admin),
            json!({ "email": "writer@peeth.org" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = user["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(
            "POST",
            "/api/users",
            Some(&admin),
            json!({ "email": "writer@peeth.org" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let role = json!({ "role": "content_editor" });
    let (status, _) = app
        .call("PUT", &format!("/api/users/{id}/role"), Some(&admin), role.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call("PUT", &format!("/api/users/{id}/role"), Some(&root), role)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "content_editor");

    let (status, users) = app.get("/api/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 3);
}
