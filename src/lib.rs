pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;
pub mod storage;

use std::sync::Arc;

use auth::ApiKeyManager;
use cache::ResearchCache;
use config::ServerConfig;
use engine::{HttpResearchEngine, ResearchEngine};
use services::TaskRegistry;
use storage::ResultStore;

/// Core application state, constructor-injected into every handler and
/// background task. Owning it here (rather than in process-wide globals)
/// keeps teardown and test isolation clean.
pub struct AppCore {
    pub config: ServerConfig,
    pub cache: ResearchCache,
    pub store: ResultStore,
    pub registry: TaskRegistry,
    pub engine: Arc<dyn ResearchEngine>,
    pub api_keys: Arc<ApiKeyManager>,
}

impl AppCore {
    /// Build state with the configured HTTP research engine.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let mut engine = HttpResearchEngine::new(config.engine.base_url.clone());
        if let Some(api_key) = &config.engine.api_key {
            engine = engine.with_api_key(api_key.clone());
        }
        Self::with_engine(config, Arc::new(engine))
    }

    /// Build state around an injected engine. Tests use this to substitute
    /// stub engines.
    pub fn with_engine(
        config: ServerConfig,
        engine: Arc<dyn ResearchEngine>,
    ) -> anyhow::Result<Self> {
        let cache = ResearchCache::new(&config.cache);
        let store = ResultStore::new(config.results_dir.clone())?;
        let api_keys = Arc::new(ApiKeyManager::from_keys(&config.auth.api_keys));

        Ok(Self {
            config,
            cache,
            store,
            registry: TaskRegistry::new(),
            engine,
            api_keys,
        })
    }
}
