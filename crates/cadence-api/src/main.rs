use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cadence_agent::Controller;
use cadence_api::{app::build_router, config::Config, state::AppState};
use cadence_llm::{AnthropicClient, ChatClient};
use cadence_search::{NoTools, TavilySearch, ToolExecutor, WebSearchExecutor};
use cadence_types::LoopConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Cadence API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let anthropic = config.llm.anthropic(&config.anthropic_api_key);
    let client: Arc<dyn ChatClient> = Arc::new(AnthropicClient::from_config(anthropic)?);

    let executor: Arc<dyn ToolExecutor> = match &config.search_api_key {
        Some(key) => {
            let provider = TavilySearch::from_config(config.search.tavily(key))?;
            tracing::info!("Web search enabled");
            Arc::new(WebSearchExecutor::new(Arc::new(provider)))
        }
        None => {
            tracing::warn!("SEARCH_API_KEY not set, web search disabled");
            Arc::new(NoTools)
        }
    };

    let loop_config = LoopConfig::from(&config.agent);
    let controller = Controller::builder()
        .client(client)
        .executor(executor)
        .ranker(config.ranking.ranker(loop_config.top_sources))
        .llm_config(config.llm.clone().into())
        .config(loop_config)
        .build()?;

    let state = Arc::new(AppState::new(config.clone(), controller));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        _ => {
            registry.with(tracing_subscriber::fmt::layer().pretty()).init();
        }
    }
}
