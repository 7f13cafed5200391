use crate::config::Config;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use std::env;
use tracing_stackdriver::CloudTraceConfiguration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,filebox_services=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
    if config.is_local() {
        // Local development: Pretty printing
        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer())
            .try_init()?;
        return Ok(());
    }

    // Set the global propagator to trace-context (W3C)
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
    let otel_layer = tracing_opentelemetry::layer();

    // JSON logging; trace correlation only when a Cloud project is known
    match env::var("GOOGLE_CLOUD_PROJECT") {
        Ok(project_id) => {
            let stackdriver_layer = tracing_stackdriver::layer()
                .with_cloud_trace(CloudTraceConfiguration { project_id });
            tracing_subscriber::registry()
                .with(env_filter())
                .with(otel_layer)
                .with(stackdriver_layer)
                .try_init()?;
        }
        Err(_) => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(otel_layer)
                .with(tracing_stackdriver::layer())
                .try_init()?;
        }
    }

    Ok(())
}
