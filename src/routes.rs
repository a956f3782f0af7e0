use crate::handlers::{auth, books, cart, favorites};
use crate::observability::{health_handler, metrics_handler, track_requests};
use crate::state::AppState;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/book", post(books::create_book).get(books::list_books))
        .route("/books", get(books::list_books))
        .route("/book/related/{id}", get(books::related_books))
        .route(
            "/book/{id}",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/book-info", get(books::books_by_category))
        .route("/book-data", get(books::all_books))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route(
            "/book-cart",
            post(cart::add_to_cart).get(cart::cart_by_email),
        )
        .route("/carts", get(cart::list_carts))
        .route("/cart/{id}", delete(cart::delete_cart_item))
        .route(
            "/favorites",
            post(favorites::add_favorite)
                .get(favorites::list_favorites)
                .delete(favorites::delete_favorite),
        )
        .route("/book-favorites", get(favorites::favorites_by_email))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        // Outside the timeout and body limit so their 408/413 are counted too.
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.allowed_origins))
        .with_state(state)
}

/// Browser access is limited to the configured origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::config::AppConfig;
    use crate::handlers::test_support::{send, test_app, test_app_with, StalledStore};
    use crate::memory::MemoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    fn stalled_app() -> Router {
        let timeout = Duration::from_millis(200);
        let config = AppConfig {
            request_timeout: timeout,
            ..AppConfig::default()
        };
        test_app_with(Arc::new(StalledStore { delay: timeout }), config)
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let app = test_app();

        let (status, health) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["checks"]["database"], "ok");

        send(&app, "GET", "/book/not-an-id", None).await;

        let (status, metrics) = send(&app, "GET", "/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        // Counted before the response is produced, so /metrics includes itself.
        assert_eq!(metrics["total_requests"], 3);
        assert_eq!(metrics["failed_requests"], 1);
    }

    #[tokio::test]
    async fn test_cors_allows_listed_origin_only() {
        let app = test_app();

        let preflight = |origin: &'static str| {
            Request::builder()
                .method("OPTIONS")
                .uri("/books")
                .header("origin", origin)
                .header("access-control-request-method", "GET")
                .body(Body::empty())
                .unwrap()
        };

        let response = app
            .clone()
            .oneshot(preflight("http://localhost:5173"))
            .await
            .unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:5173"
        );
        assert_eq!(response.headers()["access-control-allow-credentials"], "true");

        let response = app.oneshot(preflight("https://evil.example")).await.unwrap();
        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = test_app();
        let (status, _) = send(&app, "GET", "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_degrades_before_request_timeout() {
        let app = stalled_app();

        let (status, health) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(health["status"], "degraded");
        assert_eq!(health["checks"]["database"], "unavailable");
    }

    #[tokio::test]
    async fn test_slow_request_times_out_and_counts_as_failure() {
        let app = stalled_app();

        let (status, _) = send(&app, "GET", "/book-data", None).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);

        let (_, metrics) = send(&app, "GET", "/metrics", None).await;
        assert_eq!(metrics["total_requests"], 2);
        assert_eq!(metrics["successful_requests"], 0);
        assert_eq!(metrics["failed_requests"], 1);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected_and_counted() {
        let config = AppConfig {
            max_body_bytes: 16,
            ..AppConfig::default()
        };
        let app = test_app_with(Arc::new(MemoryStore::new()), config);

        let body = r#"{"name":"A rather long book title"}"#;
        let request = Request::builder()
            .method("POST")
            .uri("/book")
            .header("content-type", "application/json")
            .header("content-length", body.len())
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let (_, metrics) = send(&app, "GET", "/metrics", None).await;
        assert_eq!(metrics["total_requests"], 2);
        assert_eq!(metrics["failed_requests"], 1);
    }
}
