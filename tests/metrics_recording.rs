//! Integration tests checking the recorded OpenTelemetry metrics.

#![cfg(feature = "metrics")]

use hotswap_props::prelude::*;
use opentelemetry::metrics::MeterProvider as _;
use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData, ResourceMetrics};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Clone, Default)]
struct ServiceConfig {
    name: String,
    port: u16,
}

impl ConfigModel for ServiceConfig {
    fn load(&mut self, props: &Properties) -> std::result::Result<(), ValidationError> {
        self.name = props.get_or("name", "unnamed").to_string();
        self.port = props
            .get_or("port", "8080")
            .parse()
            .map_err(|_| ValidationError::invalid_field("port", "must be a port number"))?;
        Ok(())
    }

    fn to_properties(&self) -> Properties {
        [("name", self.name.clone()), ("port", self.port.to_string())]
            .into_iter()
            .collect()
    }
}

fn meter_provider() -> (SdkMeterProvider, InMemoryMetricExporter) {
    let exporter = InMemoryMetricExporter::default();
    let reader = PeriodicReader::builder(exporter.clone()).build();
    let provider = SdkMeterProvider::builder().with_reader(reader).build();
    (provider, exporter)
}

fn collect(provider: &SdkMeterProvider, exporter: &InMemoryMetricExporter) -> Vec<ResourceMetrics> {
    provider.force_flush().unwrap();
    exporter.get_finished_metrics().unwrap()
}

/// Latest exported value of a `u64` counter, or zero if it was never recorded.
fn counter(metrics: &[ResourceMetrics], name: &str) -> u64 {
    metrics
        .iter()
        .flat_map(|rm| rm.scope_metrics())
        .flat_map(|sm| sm.metrics())
        .filter(|m| m.name() == name)
        .filter_map(|m| match m.data() {
            AggregatedMetrics::U64(MetricData::Sum(sum)) => {
                Some(sum.data_points().map(|dp| dp.value()).sum::<u64>())
            }
            _ => None,
        })
        .last()
        .unwrap_or(0)
}

/// Latest exported value of an `i64` gauge.
fn gauge(metrics: &[ResourceMetrics], name: &str) -> Option<i64> {
    metrics
        .iter()
        .flat_map(|rm| rm.scope_metrics())
        .flat_map(|sm| sm.metrics())
        .filter(|m| m.name() == name)
        .filter_map(|m| match m.data() {
            AggregatedMetrics::I64(MetricData::Gauge(gauge)) => {
                gauge.data_points().map(|dp| dp.value()).last()
            }
            _ => None,
        })
        .last()
}

#[test]
fn test_reload_and_save_counters() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("cfg.properties");
    fs::write(&config_path, "name=Alice\n").unwrap();

    let (provider, exporter) = meter_provider();
    let manager = ConfigManager::builder(&config_path)
        .with_metrics(provider.meter("hotswap-props-test"))
        .build(ServiceConfig::default())
        .unwrap();

    // Construction applied once; this one finds nothing new.
    assert_eq!(manager.reload().unwrap(), ReloadOutcome::Unchanged);

    fs::write(&config_path, "name=Alice\nport=not-a-port\n").unwrap();
    assert!(manager.reload().is_err());

    fs::write(&config_path, "name=Bob\n").unwrap();
    assert_eq!(manager.reload().unwrap(), ReloadOutcome::Applied);

    manager.save().unwrap();
    fs::remove_file(&config_path).unwrap();
    assert!(manager.save().is_err());

    let metrics = collect(&provider, &exporter);
    assert_eq!(counter(&metrics, "hotswap_props.reload.attempts"), 4);
    assert_eq!(counter(&metrics, "hotswap_props.reload.applied"), 2);
    assert_eq!(counter(&metrics, "hotswap_props.reload.unchanged"), 1);
    assert_eq!(counter(&metrics, "hotswap_props.reload.failures"), 1);
    assert_eq!(counter(&metrics, "hotswap_props.save.success"), 1);
    assert_eq!(counter(&metrics, "hotswap_props.save.failures"), 1);
}

#[test]
fn test_subscriber_gauge_follows_handles() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("cfg.properties");

    let (provider, exporter) = meter_provider();
    let manager = ConfigManager::builder(&config_path)
        .with_metrics(provider.meter("hotswap-props-test"))
        .build(ServiceConfig::default())
        .unwrap();

    let first = manager.on_reload(|_| {});
    let _second = manager.on_reload(|_| {});
    let metrics = collect(&provider, &exporter);
    assert_eq!(gauge(&metrics, "hotswap_props.subscribers.active"), Some(2));

    // No reload happens in between; dropping the handle alone updates the gauge.
    drop(first);
    let metrics = collect(&provider, &exporter);
    assert_eq!(gauge(&metrics, "hotswap_props.subscribers.active"), Some(1));
}

#[cfg(feature = "file-watch")]
#[tokio::test]
async fn test_watcher_reloads_are_counted() {
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("cfg.properties");
    fs::write(&config_path, "name=Alice\n").unwrap();

    let (provider, exporter) = meter_provider();
    let manager = ConfigManager::builder(&config_path)
        .with_file_watch(true)
        .with_metrics(provider.meter("hotswap-props-test"))
        .build(ServiceConfig::default())
        .unwrap();

    fs::write(&config_path, "name=Bob\n").unwrap();
    let reloaded = timeout(Duration::from_secs(5), async {
        while manager.read(|cfg| cfg.name != "Bob") {
            sleep(Duration::from_millis(25)).await;
        }
    })
    .await;
    assert!(reloaded.is_ok());
    manager.stop_watching().await.unwrap();

    let metrics = collect(&provider, &exporter);
    assert!(counter(&metrics, "hotswap_props.reload.applied") >= 2);
    assert_eq!(counter(&metrics, "hotswap_props.reload.failures"), 0);
}
