use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use peeth_auth::auth_routes;

use crate::{
    handlers::{
        cms::{
            create_component, create_page, delete_component, delete_page, get_component,
            get_page, get_page_by_slug, list_components, list_pages, reorder_components,
            update_component, update_page,
        },
        content::{
            create_content, delete_content, get_content, get_content_by_slug, list_content,
            publish_content, update_content,
        },
        health::{healthz, livez},
        users::{create_user, delete_user, get_user, list_users, update_role},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let api_routes = Router::new()
        // CMS routes
        .route("/cms/pages", get(list_pages).post(create_page))
        .route(
            "/cms/pages/{id}",
            get(get_page).put(update_page).delete(delete_page),
        )
        .route("/cms/pages/slug/{slug}", get(get_page_by_slug))
        .route(
            "/cms/pages/{id}/components",
            get(list_components).post(create_component),
        )
        .route("/cms/pages/{id}/components/order", put(reorder_components))
        .route(
            "/cms/components/{id}",
            get(get_component)
                .put(update_component)
                .delete(delete_component),
        )
        // Content routes
        .route("/content", get(list_content).post(create_content))
        .route("/content/slug/{slug}", get(get_content_by_slug))
        .route(
            "/content/{id}",
            get(get_content).put(update_content).delete(delete_content),
        )
        .route("/content/{id}/publish", post(publish_content))
        // User routes
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/users/{id}/role", put(update_role));

    let auth = auth_routes().with_state(state.auth.clone());

    Router::new()
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .nest("/api", api_routes)
        .with_state(state)
        .merge(auth)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
}

#[cfg(all(test, feature = "document"))]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use peeth_auth::{AuthConfig, LogOtpSender};
    use tower::ServiceExt;

    use crate::storage::document::DocumentStore;

    async fn state() -> AppState {
        let storage = DocumentStore::open_in_memory().await.unwrap();
        AppState::new(
            Arc::new(storage),
            AuthConfig::new("app-secret"),
            Arc::new(LogOtpSender),
        )
    }

    #[tokio::test]
    async fn test_healthz_reports_backend() {
        let app = create_app(state().await);

        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["storage"], "document");
    }

    #[tokio::test]
    async fn test_list_pages_empty() {
        let app = create_app(state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/cms/pages")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert!(json.is_empty());
    }

    #[tokio::test]
    async fn test_writes_require_a_token() {
        let app = create_app(state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/content")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "slug": "x",
                            "contentType": "article",
                            "title": {"en": "X"},
                            "body": {"en": "Y"},
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
