//! Example demonstrating file watching and automatic reload of a properties file.
//!
//! This example shows how to:
//! - Bind a typed model to a properties file that is created on first run
//! - Reload the model automatically when the file is edited
//! - Subscribe to reload notifications
//! - Save changes made in code back to the file
//!
//! Run with: cargo run --example live_reload
//!
//! While running, try editing demos/config/live_reload.properties.

use hotswap_props::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct ServerConfig {
    host: String,
    port: u16,
    max_connections: u32,
    verbose: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            max_connections: 10,
            verbose: false,
        }
    }
}

fn field<T: std::str::FromStr>(
    props: &Properties,
    key: &'static str,
    default: T,
) -> std::result::Result<T, ValidationError> {
    match props.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ValidationError::invalid_field(key, format!("cannot parse '{}'", raw))),
        None => Ok(default),
    }
}

impl ConfigModel for ServerConfig {
    fn load(&mut self, props: &Properties) -> std::result::Result<(), ValidationError> {
        let defaults = ServerConfig::default();
        self.host = props.get_or("server.host", &defaults.host).to_string();
        self.port = field(props, "server.port", defaults.port)?;
        self.max_connections = field(props, "server.max_connections", defaults.max_connections)?;
        self.verbose = field(props, "server.verbose", defaults.verbose)?;
        Ok(())
    }

    fn to_properties(&self) -> Properties {
        [
            ("server.host", self.host.clone()),
            ("server.port", self.port.to_string()),
            ("server.max_connections", self.max_connections.to_string()),
            ("server.verbose", self.verbose.to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn validate(&mut self) {
        if self.max_connections == 0 {
            self.max_connections = 1;
        }
    }
}

fn print_config(cfg: &ServerConfig) {
    println!("  Server: {}:{}", cfg.host, cfg.port);
    println!(
        "  Max connections: {} (verbose: {})",
        cfg.max_connections, cfg.verbose
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Live Reload Example ===\n");

    let config_path = "demos/config/live_reload.properties";
    if let Some(parent) = std::path::Path::new(config_path).parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }

    let manager = ConfigManager::builder(config_path)
        .with_file_watch(true)
        .with_watch_debounce(Duration::from_millis(200))
        .with_header("Live reload demo settings")
        .build(ServerConfig::default())?;

    // Write the defaults so there is something to edit
    manager.save()?;
    println!("Watching: {} ({:?})\n", config_path, manager.watch_state());

    let reload_count = Arc::new(AtomicUsize::new(0));
    let reload_count_clone = Arc::clone(&reload_count);
    let _subscription = manager.on_reload(move |props| {
        let count = reload_count_clone.fetch_add(1, Ordering::SeqCst) + 1;
        println!("\n[Event] Configuration reloaded (reload #{})", count);
        for (key, value) in props {
            println!("  {} = {}", key, value);
        }
    });

    println!("Current configuration:");
    manager.read(print_config);

    println!("\n===> Try editing {} to see automatic reloads! <===", config_path);
    println!("     Example changes:");
    println!("     - server.port=9090");
    println!("     - server.max_connections=abc (rejected, previous values stay)");
    println!("\nPress Ctrl+C to exit\n");

    let mut ticker = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let count = reload_count.load(Ordering::SeqCst);
                println!("[Status] Config check (reloads: {}):", count);
                manager.read(print_config);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    manager.stop_watching().await?;
    println!("\nWatcher stopped ({:?})", manager.watch_state());
    Ok(())
}
