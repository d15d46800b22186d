use anyhow::{Result, anyhow};
use once_cell::sync::OnceCell;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{self as sdk, Resource};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: OnceCell<()> = OnceCell::new();
static PROVIDER: OnceCell<sdk::trace::SdkTracerProvider> = OnceCell::new();

pub const DEFAULT_FILTER: &str = "info,tower_http=warn,sqlx=warn";

/// Configuration for tracing initialization.
#[derive(Clone, Debug)]
pub struct ObsConfig {
    pub service_name: &'static str,
    pub env_filter: Option<String>,
    pub otlp_endpoint: Option<String>,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            service_name: "employee-suite",
            env_filter: None,
            otlp_endpoint: None,
        }
    }
}

impl ObsConfig {
    /// Reads `RUST_LOG` and `OTLP_ENDPOINT` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            env_filter: non_blank("RUST_LOG"),
            otlp_endpoint: non_blank("OTLP_ENDPOINT"),
            ..Self::default()
        }
    }

    /// An explicit filter (e.g. from a CLI flag) replaces the environment's.
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        if let Some(filter) = filter.filter(|filter| !filter.trim().is_empty()) {
            self.env_filter = Some(filter);
        }
        self
    }

    pub fn resolved_filter(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(DEFAULT_FILTER)
    }
}

/// Install tracing subscribers with optional OTLP exporter.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing(config: ObsConfig) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_new(config.resolved_filter())?;
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if let Some(endpoint) = config.otlp_endpoint {
        let exporter = SpanExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(endpoint)
            .build()?;

        let resource = Resource::builder()
            .with_service_name(config.service_name)
            .build();

        let provider = sdk::trace::SdkTracerProvider::builder()
            .with_resource(resource)
            .with_batch_exporter(exporter)
            .build();
        let tracer = provider.tracer(config.service_name);
        let _ = PROVIDER.set(provider);

        registry
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()?;
    } else {
        registry.try_init()?;
    }

    INIT.set(())
        .map_err(|_| anyhow!("tracing already initialized"))?;
    Ok(())
}

/// Flush pending spans. A no-op when no OTLP exporter was installed.
pub fn shutdown_tracing() {
    if let Some(provider) = PROVIDER.get() {
        if let Err(err) = provider.shutdown() {
            eprintln!("failed to flush traces: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ObsConfig {
        let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
        ObsConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()))
    }

    #[test]
    fn unset_environment_uses_default_filter() {
        let config = from_pairs(&[("RUST_LOG", " ")]);
        assert_eq!(config.resolved_filter(), DEFAULT_FILTER);
        assert_eq!(config.otlp_endpoint, None);
        assert_eq!(config.service_name, "employee-suite");
    }

    #[test]
    fn cli_filter_overrides_rust_log() {
        let config = from_pairs(&[
            ("RUST_LOG", "warn"),
            ("OTLP_ENDPOINT", "http://collector:4318/v1/traces"),
        ]);
        assert_eq!(config.resolved_filter(), "warn");
        assert_eq!(
            config.otlp_endpoint.as_deref(),
            Some("http://collector:4318/v1/traces")
        );

        let config = config.with_filter(Some("products_hr=debug".into()));
        assert_eq!(config.resolved_filter(), "products_hr=debug");
        let config = config.with_filter(None);
        assert_eq!(config.resolved_filter(), "products_hr=debug");
    }

    #[test]
    fn repeated_init_is_harmless() {
        let config = from_pairs(&[]).with_filter(Some("warn".into()));
        init_tracing(config.clone()).unwrap();
        init_tracing(config).unwrap();
        shutdown_tracing();
    }
}
