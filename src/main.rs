use std::sync::Arc;

use skystuff_gateway::modules;
use skystuff_gateway::proxy;

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = modules::logger::init_logger();

    let mut config = match modules::config::load_gateway_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!("failed to load gateway config: {}. using defaults", err);
            let cfg = proxy::GatewayConfig::default();
            let _ = modules::config::save_gateway_config(&cfg);
            cfg
        }
    };

    if let Ok(value) = std::env::var("SKYSTUFF_ALLOW_LAN") {
        let enabled = matches!(value.as_str(), "1" | "true" | "yes" | "on");
        if enabled {
            config.allow_lan_access = true;
        }
    }

    let bind_address = if let Ok(addr) = std::env::var("SKYSTUFF_BIND") {
        if addr != "127.0.0.1" && addr != "localhost" {
            config.allow_lan_access = true;
        }
        addr
    } else {
        config.get_bind_address().to_string()
    };

    let auth: Arc<dyn proxy::auth::AuthGate> = Arc::new(proxy::auth::AuthClient::new(&config));
    let upstream = Arc::new(proxy::upstream::UpstreamClient::new(&config));

    let port = config.port;
    let (server, handle) = proxy::AxumServer::start(bind_address.clone(), port, config, auth, upstream)
        .await
        .map_err(|e| format!("failed to start gateway server: {}", e))?;

    tracing::info!(
        "skystuff gateway listening on http://{}:{}",
        bind_address,
        port
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {}", e))?;

    tracing::info!("shutdown requested, stopping server...");
    server.stop();
    let _ = handle.await;

    Ok(())
}
