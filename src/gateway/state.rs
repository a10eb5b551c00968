use std::sync::Arc;

use crate::cache::CacheBackend;
use crate::config::Config;
use crate::embed::EmbedProvider;
use crate::orchestrator::RerankOrchestrator;
use crate::rerank::RerankProvider;
use crate::retrieval::{HybridRetriever, NoopSpecialtyLookup, SpecialtyLookupProvider};
use crate::store::RetrievalStoreClient;

/// Shared handler state for the Axum router.
///
/// Generic over every collaborator's concrete type so `main.rs` can wire up
/// real (Postgres/Redis/HTTP) implementations while tests wire up mocks,
/// without the gateway itself depending on either.
pub struct HandlerState<S, E, B, Pr, Fb, L = NoopSpecialtyLookup>
where
    S: RetrievalStoreClient + Send + Sync + 'static,
    E: EmbedProvider + Send + Sync + 'static,
    B: CacheBackend + Send + Sync + 'static,
    L: SpecialtyLookupProvider + Send + Sync + 'static,
    Pr: RerankProvider + Send + Sync + 'static,
    Fb: RerankProvider + Send + Sync + 'static,
{
    pub retriever: Arc<HybridRetriever<S, E, B, L>>,
    pub orchestrator: Arc<RerankOrchestrator<B, Pr, Fb>>,
    pub store: Arc<S>,
    pub config: Arc<Config>,
}

// Manual `Clone` impl: deriving would require `S`, `E`, `B`, `Pr`, `Fb`, `L`
// to themselves be `Clone`, but every field here is already an `Arc`.
impl<S, E, B, Pr, Fb, L> Clone for HandlerState<S, E, B, Pr, Fb, L>
where
    S: RetrievalStoreClient + Send + Sync + 'static,
    E: EmbedProvider + Send + Sync + 'static,
    B: CacheBackend + Send + Sync + 'static,
    L: SpecialtyLookupProvider + Send + Sync + 'static,
    Pr: RerankProvider + Send + Sync + 'static,
    Fb: RerankProvider + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            retriever: self.retriever.clone(),
            orchestrator: self.orchestrator.clone(),
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, E, B, Pr, Fb, L> HandlerState<S, E, B, Pr, Fb, L>
where
    S: RetrievalStoreClient + Send + Sync + 'static,
    E: EmbedProvider + Send + Sync + 'static,
    B: CacheBackend + Send + Sync + 'static,
    L: SpecialtyLookupProvider + Send + Sync + 'static,
    Pr: RerankProvider + Send + Sync + 'static,
    Fb: RerankProvider + Send + Sync + 'static,
{
    pub fn new(
        retriever: HybridRetriever<S, E, B, L>,
        orchestrator: RerankOrchestrator<B, Pr, Fb>,
        store: S,
        config: Config,
    ) -> Self {
        Self {
            retriever: Arc::new(retriever),
            orchestrator: Arc::new(orchestrator),
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}
