use std::sync::Arc;

use geo_chat::chat::chat_routes;
use geo_chat::config::ServerConfig;
use geo_chat::llm::{LlmConfig, create_provider};
use geo_chat::relay::{ProviderRelay, Relay};

#[tokio::main]
async fn main() -> geo_chat::error::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export OPENAI_KEY=sk-...");
        std::process::exit(1);
    });

    eprintln!("🌍 geo-chat v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Stream API: http://{}/api/stream", config.bind_addr());
    eprintln!("   Chat WS: ws://{}/ws/chat", config.bind_addr());

    let llm = create_provider(&LlmConfig::from(&config))?;
    let relay: Arc<dyn Relay> = Arc::new(ProviderRelay::new(llm));
    let app = chat_routes(relay);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Chat server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Ctrl+C received, shutting down...");
        })
        .await?;

    Ok(())
}
