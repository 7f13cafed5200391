mod common;

use axum::http::StatusCode;
use common::{test_server, unavailable_server};
use filebox_services::storage::MockObjectStorage;

#[tokio::test]
async fn test_health_check_integration() {
    // Case 1: Gateway ready
    let server = test_server(MockObjectStorage::new()).await;

    let response = server.get("/is-health").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.header("x-service-env"), "local");

    // Case 2: Gateway never built
    let server = unavailable_server().await;

    let response = server.get("/is-health").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}
