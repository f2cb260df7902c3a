use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cineai_api::cache::{self, Cache};
use cineai_api::config::Config;
use cineai_api::routes::{create_router, AppState};
use cineai_api::services::{
    AccountService, Aggregator, Argon2Verifier, ChatService, ContentGenerator, DisabledGenerator,
    GeminiClient, TmdbClient,
};
use cineai_api::store::{postgres, MovieStore, PostgresStore, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cineai_api=info,tower_http=info")),
        )
        .init();

    let pool = postgres::create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;
    let store = Arc::new(PostgresStore::new(pool));
    let users: Arc<dyn UserStore> = store.clone();
    let movies: Arc<dyn MovieStore> = store;

    let redis_client = cache::create_redis_client(&config.redis_url)?;
    let (catalog_cache, cache_writer) = Cache::new(redis_client).await;

    let catalog = Arc::new(TmdbClient::new(
        catalog_cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    )?);

    let generator: Arc<dyn ContentGenerator> = match &config.gemini_api_key {
        Some(key) => Arc::new(GeminiClient::new(key.clone(), config.gemini_api_url.clone())?),
        None => {
            tracing::warn!("No generator API key configured; chat and recommendations disabled");
            Arc::new(DisabledGenerator)
        }
    };

    let aggregator = Arc::new(Aggregator::new(
        catalog,
        generator.clone(),
        movies,
        users.clone(),
    ));
    let accounts = Arc::new(AccountService::new(users.clone(), Arc::new(Argon2Verifier)));
    let chat = Arc::new(ChatService::new(users, generator));

    let app = create_router(AppState {
        aggregator,
        accounts,
        chat,
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server started");
    axum::serve(listener, app).await?;

    // Flush pending cache writes before exiting.
    cache_writer.shutdown().await;

    Ok(())
}
