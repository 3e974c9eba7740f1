use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tracing::{Level, info};
use uuid::Uuid;

use beacon_server::{
    AppState, Bridge, LocalBus, RedisBridge, RelayConfig, RelayService, router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = RelayConfig::from_env();
    let origin = Uuid::new_v4();

    let (bridge, bridge_rx): (Arc<dyn Bridge>, _) = match &config.redis_url {
        Some(url) => {
            let (bridge, rx) = RedisBridge::connect(url).await?;
            info!("Bridging room traffic through Redis at {}", url);
            (Arc::new(bridge), rx)
        }
        None => {
            info!("No BEACON_REDIS_URL set, running single-process");
            let (bridge, rx) = LocalBus::new().attach(origin);
            (Arc::new(bridge), rx)
        }
    };

    let relay = RelayService::start(config.clone(), origin, bridge, bridge_rx);
    let state = Arc::new(AppState { relay });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = router(state).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Signaling relay listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
