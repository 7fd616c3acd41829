use clap::Parser;
use log::{error, info};
use server::config::Config;
use server::network::{Server, ServerMessage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = Config::parse();
    let mut server = Server::new(&config).await?;

    if config.allow_all_origins {
        info!("Accepting sessions from any origin");
    } else if !config.allowed_origins.is_empty() {
        info!("Allowed origins: {}", config.allowed_origins.join(", "));
    }

    // Ctrl+C stops the engine loop between messages
    let shutdown = server.handle();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
        if let Err(e) = shutdown.send(ServerMessage::Shutdown) {
            error!("Failed to signal shutdown: {}", e);
        }
    });

    if let Err(e) = server.run().await {
        error!("Server stopped with error: {}", e);
    }

    Ok(())
}
