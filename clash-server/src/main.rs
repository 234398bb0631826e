use std::sync::Arc;

use tokio::signal;
use tracing::info;

use clash_server::{config::Config, create_routes, registry::SessionRegistry};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    info!("Starting Word Clash server...");

    let config = Config::new();
    let registry = Arc::new(SessionRegistry::new(&config));

    let routes = create_routes(registry.clone());

    // Periodic sweep for abandoned games
    let cleanup_registry = registry.clone();
    let game_timeout = chrono::Duration::minutes(config.game_timeout_minutes as i64);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        loop {
            interval.tick().await;
            let removed = cleanup_registry.cleanup_expired_games(game_timeout).await;
            if removed > 0 {
                info!(removed, "cleaned up expired games");
            }
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config.host.parse::<std::net::IpAddr>().unwrap(),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
