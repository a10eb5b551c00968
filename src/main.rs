//! `talent-rerank` HTTP server entrypoint.

use std::net::SocketAddr;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;

use talent_rerank::cache::{LayeredCache, NoopBackend, RedisBackend};
use talent_rerank::config::Config;
use talent_rerank::constants::DimConfig;
use talent_rerank::embed::HttpEmbedProvider;
use talent_rerank::gateway::{HandlerState, create_router};
use talent_rerank::lifecycle::shutdown_signal;
use talent_rerank::orchestrator::RerankOrchestrator;
use talent_rerank::rerank::HttpRerankProvider;
use talent_rerank::retrieval::HybridRetriever;
use talent_rerank::store::{PgRetrievalStoreClient, RetrievalStoreClient};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(bind_addr = %config.bind_addr, port = config.port, "talent-rerank starting");

    let store = PgRetrievalStoreClient::connect(&config).await?;
    store.warmup_pool().await;

    let http_client = reqwest::Client::new();
    let embed_provider = HttpEmbedProvider::with_dim_config(
        http_client.clone(),
        config.embed_base_url.clone(),
        config.embed_model.clone(),
        DimConfig::new(config.embedding_dim),
    );

    let primary = HttpRerankProvider::new("primary", http_client.clone(), config.primary_provider.clone());
    let fallback = HttpRerankProvider::new("fallback", http_client.clone(), config.fallback_provider.clone());

    if config.cache_disable {
        tracing::info!("cache disabled, running with a no-op backend");
        run_server(config, addr, store, embed_provider, NoopBackend, primary, fallback).await
    } else {
        let redis_url = config.redis_url();
        tracing::info!(redis_host = %config.redis_host, "connecting to Redis");
        let backend = RedisBackend::connect(&redis_url).await?;
        run_server(config, addr, store, embed_provider, backend, primary, fallback).await
    }
}

async fn run_server<B>(
    config: Config,
    addr: SocketAddr,
    store: PgRetrievalStoreClient,
    embed_provider: HttpEmbedProvider,
    backend: B,
    primary: HttpRerankProvider,
    fallback: HttpRerankProvider,
) -> anyhow::Result<()>
where
    B: talent_rerank::cache::CacheBackend + Clone + Send + Sync + 'static,
{
    let retrieval_cache = LayeredCache::new(backend.clone(), config.cache_key_prefix.clone(), config.l1_capacity)
        .with_ttl_override_secs(config.cache_ttl_override_secs);
    let retriever = HybridRetriever::new(store.clone(), embed_provider, retrieval_cache);

    let rerank_cache = LayeredCache::new(backend, config.cache_key_prefix.clone(), config.l1_capacity)
        .with_ttl_override_secs(config.cache_ttl_override_secs);
    let orchestrator = RerankOrchestrator::new(rerank_cache, primary, fallback)
        .with_graceful_degradation(config.enable_fallback);

    let state = HandlerState::new(retriever, orchestrator, store, config);
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("talent-rerank shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("SEARCH_PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(8080);
    let url = format!("http://127.0.0.1:{port}/healthz");

    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().expect("failed to build runtime");

    rt.block_on(async {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(1)).build().expect("failed to build client");

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}
