use std::sync::Arc;

use lex_assist::config::AppConfig;
use lex_assist::gemini::GeminiClient;
use lex_assist::routes::{AppState, app};
use lex_assist::session::spawn_sweep_task;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env();

    eprintln!("⚖️  Lex Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Pages: http://0.0.0.0:{}/", config.port);
    if config.api_key.is_none() {
        eprintln!("   Warning: GEMINI_API_KEY not set — submissions will fail until it is.");
    }

    let generator = Arc::new(GeminiClient::new(config.api_key.clone(), config.model.clone()));
    let state = AppState::new(generator, &config);

    // Idle-session sweeps, one per wizard store.
    let _sweeps = (
        spawn_sweep_task(Arc::clone(&state.tos)),
        spawn_sweep_task(Arc::clone(&state.small_claims)),
        spawn_sweep_task(Arc::clone(&state.tenancy)),
        spawn_sweep_task(Arc::clone(&state.citation)),
    );

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "HTTP server started");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
