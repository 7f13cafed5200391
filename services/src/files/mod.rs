//! HTTP surface of the file registry, mounted under `/file`.

pub mod handlers;
pub mod types;

use crate::registry::{FileLookup, FileRegistry, LinearScan};
use crate::storage::ObjectStorage;
use axum::{
    Router,
    routing::{get, post},
};

/// Shared state for the `/file` routes.
#[derive(Clone)]
pub struct AppState<S, L = LinearScan> {
    pub registry: FileRegistry<S, L>,
}

impl<S, L> AppState<S, L> {
    pub fn new(registry: FileRegistry<S, L>) -> Self {
        Self { registry }
    }
}

/// Creates the router for the file endpoints.
///
/// # Type Parameters
///
/// * `S` - Object storage gateway
/// * `L` - Strategy used to resolve file ids to keys
pub fn file_routes<S, L>() -> Router<AppState<S, L>>
where
    S: ObjectStorage,
    L: FileLookup,
{
    Router::new()
        .route(
            "/",
            get(handlers::list_all::<S, L>)
                .post(handlers::upload::<S, L>)
                .delete(handlers::delete_all::<S, L>),
        )
        .route("/multiple", post(handlers::upload_many::<S, L>))
        .route("/user/{user_id}", get(handlers::list_by_owner::<S, L>))
        .route(
            "/user/{user_id}/{file_id}",
            get(handlers::download_for_owner::<S, L>),
        )
        .route(
            "/presign/{user_id}/{file_name}",
            get(handlers::presign_upload::<S, L>),
        )
        .route("/{file_id}", get(handlers::fetch_by_id::<S, L>))
}
