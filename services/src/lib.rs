use crate::config::Config;
use crate::files::{AppState, file_routes};
use crate::registry::{FileLookup, FileRegistry};
use crate::storage::ObjectStorage;
use axum::{
    Router,
    extract::{Extension, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{any, get},
};
use opentelemetry::{global, propagation::Extractor};
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub mod config;
pub mod files;
pub mod registry;
pub mod storage;
pub mod telemetry;

const BUILD_VERSION: &str = env!("BUILD_VERSION");

struct HeaderExtractor<'a>(&'a axum::http::HeaderMap);

impl<'a> Extractor for HeaderExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Creates the service router around a file registry.
pub async fn routes<S, L>(registry: FileRegistry<S, L>, config: Config) -> Router
where
    S: ObjectStorage,
    L: FileLookup,
{
    let state = AppState::new(registry);

    Router::new()
        .route("/is-health", get(health_check::<S, L>))
        .nest("/file", file_routes::<S, L>())
        .fallback(any(catch_all))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                // Check if the request has a trace context header
                let parent_context = global::get_text_map_propagator(|propagator| {
                    propagator.extract(&HeaderExtractor(request.headers()))
                });

                let span = tracing::info_span!(
                    "http_request",
                    http_request.method = ?request.method(),
                    http_request.uri = ?request.uri(),
                    http_request.version = ?request.version(),
                    http_request.user_agent = ?request.headers().get(axum::http::header::USER_AGENT),
                    otp_trace_id = tracing::field::Empty,
                );

                span.set_parent(parent_context);

                span
            }),
        )
        .layer(Extension(config))
        .with_state(state)
}

async fn health_check<S, L>(
    State(state): State<AppState<S, L>>,
    Extension(config): Extension<Config>,
) -> impl IntoResponse
where
    S: ObjectStorage,
    L: FileLookup,
{
    let mut response = if state.registry.could_connected().await {
        (StatusCode::OK, "OK").into_response()
    } else {
        (StatusCode::BAD_GATEWAY, "502").into_response()
    };

    let env_value = config.environment().to_string();
    response.headers_mut().insert(
        HeaderName::from_static("x-service-env"),
        HeaderValue::from_str(&env_value).expect("environment header is valid ASCII"),
    );

    if let Ok(version) = HeaderValue::from_str(BUILD_VERSION) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-service-version"), version);
    }

    response
}

async fn catch_all() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing to see here")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RegistrySettings, UploadItem};
    use crate::storage::MockObjectStorage;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn app_with(storage: MockObjectStorage) -> Router {
        let registry = FileRegistry::new(storage, RegistrySettings::default());
        routes(registry, Config::new_for_test()).await
    }

    #[tokio::test]
    async fn test_health_check_connected() {
        let app = app_with(MockObjectStorage::new()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/is-health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_check_includes_headers() {
        let app = app_with(MockObjectStorage::new()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/is-health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let env_header = response
            .headers()
            .get("x-service-env")
            .and_then(|v| v.to_str().ok());
        assert_eq!(env_header, Some("local"));
        let version_header = response
            .headers()
            .get("x-service-version")
            .and_then(|v| v.to_str().ok());
        assert_eq!(version_header, Some(BUILD_VERSION));
        assert!(BUILD_VERSION.starts_with(env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn test_health_check_backend_unavailable() {
        let registry: FileRegistry<MockObjectStorage> =
            FileRegistry::unavailable("missing credentials", RegistrySettings::default());
        let app = routes(registry, Config::new_for_test()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/is-health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = app_with(MockObjectStorage::new()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nothing/here")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_fetch_by_id_sets_attachment_headers() {
        let storage = MockObjectStorage::new();
        let registry = FileRegistry::new(storage.clone(), RegistrySettings::default());
        let record = registry
            .upload("u1", UploadItem::new("a.pdf", "application/pdf", b"%PDF".to_vec()))
            .await
            .unwrap();
        let app = routes(registry, Config::new_for_test()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/file/{}", record.file_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/octet-stream"
        );
        assert_eq!(
            response.headers().get("content-disposition").unwrap().to_str().unwrap(),
            format!("attachment; filename=\"file_{}\"", record.file_id)
        );
    }
}
