//! Shared test utilities for integration tests.

use axum_test::TestServer;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use filebox_services::{
    config::Config,
    registry::{FileRegistry, RegistrySettings},
    routes,
    storage::MockObjectStorage,
};
use serde_json::{Value, json};

/// Builds a test server over `storage` with default registry settings.
pub async fn test_server(storage: MockObjectStorage) -> TestServer {
    let registry = FileRegistry::new(storage, RegistrySettings::default());
    let app = routes(registry, Config::new_for_test()).await;
    TestServer::new(app).unwrap()
}

/// Builds a test server whose storage gateway could not be constructed.
#[allow(dead_code)]
pub async fn unavailable_server() -> TestServer {
    let registry: FileRegistry<MockObjectStorage> =
        FileRegistry::unavailable("no credentials", RegistrySettings::default());
    let app = routes(registry, Config::new_for_test()).await;
    TestServer::new(app).unwrap()
}

/// JSON body for one upload.
#[allow(dead_code)]
pub fn upload_body(user_id: &str, file_name: &str, content_type: &str, content: &[u8]) -> Value {
    json!({
        "userId": user_id,
        "fileName": file_name,
        "contentType": content_type,
        "fileData": BASE64_STANDARD.encode(content),
    })
}
