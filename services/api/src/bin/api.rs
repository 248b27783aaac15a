//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{build_client, DbAdapter, OpenAiGatewayAdapter},
    config::Config,
    error::ApiError,
    web::{self, state::AppState},
};
use compliance_core::{
    draft::{DraftPipeline, ValidationPolicy},
    ChatProxy, IdentityResolver,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the LLM Gateway Adapters ---
    let api_key = config
        .llm_api_key
        .as_ref()
        .ok_or_else(|| ApiError::Internal("LLM_API_KEY is required".to_string()))?;
    let llm_client = build_client(api_key, &config.llm_api_base);

    let draft_llm = Arc::new(OpenAiGatewayAdapter::new(
        llm_client.clone(),
        config.draft_model.clone(),
        config.llm_timeout,
    ));
    let chat_llm = Arc::new(OpenAiGatewayAdapter::new(
        llm_client,
        config.chat_model.clone(),
        config.llm_timeout,
    ));

    // --- 4. Build the Shared AppState ---
    if !config.enforce_auth {
        warn!("ENFORCE_AUTH is off: /draft and /chat accept anonymous callers");
    }
    let identity = IdentityResolver::new(db_adapter.clone()).with_deadline(config.identity_timeout);
    let drafts = DraftPipeline::new(
        draft_llm,
        ValidationPolicy {
            min_notice_chars: config.strict_min_notice_chars,
        },
    );

    let app_state = Arc::new(AppState {
        accounts: db_adapter,
        identity,
        drafts,
        chat: ChatProxy::new(chat_llm),
        config: config.clone(),
    });

    // --- 5. Start the Server ---
    let app = web::router(app_state);
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
