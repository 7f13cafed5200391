use filebox_services::{
    config::{Config, StorageBackend},
    registry::{FileRegistry, RegistrySettings},
    routes,
    storage::{MockObjectStorage, ObjectStorage, S3ObjectStorage, Storage},
    telemetry,
};
use std::net::{IpAddr, SocketAddr};
use tracing::{info, warn};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const BUILD_DATE: &str = env!("BUILD_DATE");
const BUILD_COMMIT: &str = env!("BUILD_COMMIT");
const BUILD_VERSION: &str = env!("BUILD_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config: Config = Config::init()?;

    // Initialize tracing
    telemetry::init_tracing(&config)?;

    // Print build information
    print_build_info();

    info!(
        environment = %config.environment(),
        server_addr = %config.server_addr(),
        port = %config.port(),
        storage_backend = %config.storage_backend(),
        bucket = %config.s3_bucket(),
        "Configuration loaded"
    );

    let registry = build_registry(&config).await;

    // Build the application router
    let route = routes(registry, config.clone()).await;

    // Create socket address
    let addr = SocketAddr::from((config.server_addr().parse::<IpAddr>()?, config.port()));

    info!("Starting server on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, route).await?;

    Ok(())
}

/// Builds the storage gateway and probes it once. A gateway that cannot be
/// built or reached leaves the registry in a permanent unavailable state
/// instead of stopping startup.
async fn build_registry(config: &Config) -> FileRegistry<Storage> {
    let settings = config.registry_settings();

    match config.storage_backend() {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; files are lost on restart");
            FileRegistry::new(
                Storage::Memory(MockObjectStorage::new().with_page_size(config.list_page_size())),
                settings,
            )
        }
        StorageBackend::S3 => match S3ObjectStorage::new(&config.s3_storage_config()) {
            Ok(storage) => gateway_or_unavailable(Storage::S3(storage), settings).await,
            Err(e) => {
                tracing::error!("Failed to build S3 storage gateway: {}", e);
                FileRegistry::unavailable(e.to_string(), settings)
            }
        },
    }
}

/// The S3 builder accepts missing or wrong credentials; only a request
/// against the bucket reveals them.
async fn gateway_or_unavailable<S: ObjectStorage>(
    storage: S,
    settings: RegistrySettings,
) -> FileRegistry<S> {
    if storage.could_connected().await {
        info!(bucket = %settings.bucket, "Storage gateway reachable");
        FileRegistry::new(storage, settings)
    } else {
        tracing::error!(bucket = %settings.bucket, "Storage gateway failed its startup check");
        FileRegistry::unavailable(
            format!("bucket {} is not reachable with the configured credentials", settings.bucket),
            settings,
        )
    }
}

/// Print build information
fn print_build_info() {
    info!("===========================================");
    info!("  Filebox Services");
    info!("===========================================");
    info!("Build Date:   {}", BUILD_DATE);
    info!("Build Commit: {}", BUILD_COMMIT);
    info!("Version:      {}", BUILD_VERSION);
    info!("===========================================");
}
