//! Application state wiring the recommender to its adapters.
//!
//! The recommender is generic over its ports; AppState pins it to the
//! concrete infra implementations. Shared by CLI commands and HTTP handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use curio_core::embedding::box_embedder::BoxEmbedder;
use curio_core::embedding::caching::CachingEmbedder;
use curio_core::llm::gateway::LlmGateway;
use curio_core::orchestrator::recommender::Recommender;
use curio_core::quota::manager::QuotaManager;
use curio_infra::config::{load_config, resolve_data_dir};
use curio_infra::content::InMemoryContentRepository;
use curio_infra::crypto::vault::VaultCrypto;
use curio_infra::embedding::FastEmbedder;
use curio_infra::llm::HttpProviderFactory;
use curio_infra::memory::{MemoryCacheStore, MemoryCounterStore};
use curio_infra::secret::shared_key_from_env;
use curio_infra::sqlite::pool::{DatabasePool, database_url};
use curio_infra::sqlite::user_key::SqliteUserKeyStore;
use curio_types::config::RecommenderConfig;
use curio_types::secret::Redacted;

/// Recommender pinned to the infra adapters.
pub type ConcreteRecommender = Recommender<
    InMemoryContentRepository,
    MemoryCacheStore,
    MemoryCounterStore,
    SqliteUserKeyStore,
    HttpProviderFactory,
>;

/// Startup options coming from global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Content snapshot; defaults to `{data_dir}/content.json`.
    pub content_path: Option<PathBuf>,
    /// Skip loading the local embedding model.
    pub no_embeddings: bool,
    /// Derive the vault key from a password (Argon2id) instead of the key file.
    pub vault_password: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<ConcreteRecommender>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data dir, load config and content, open the key store
    /// and wire the recommender.
    pub async fn init(options: &InitOptions) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let db_url = format!("{}?mode=rwc", database_url(&data_dir));
        let db_pool = DatabasePool::new(&db_url).await?;

        // Master key lives next to the database rather than in the OS
        // keychain so CLI invocations never prompt.
        let vault = match options.vault_password.as_deref() {
            Some(password) if !password.is_empty() => VaultCrypto::from_password(password)?,
            _ => VaultCrypto::from_key_file(&data_dir.join("vault.key"))?,
        };
        let key_store = SqliteUserKeyStore::new(db_pool, Arc::new(vault));

        let content_path = options
            .content_path
            .clone()
            .unwrap_or_else(|| data_dir.join("content.json"));
        let repository = InMemoryContentRepository::load(&content_path).await?;

        let shared_key = shared_key_from_env(&config.llm.shared_key_env);
        if shared_key.is_none() {
            tracing::info!(
                var = %config.llm.shared_key_env,
                "no shared API key configured; users without a key get heuristic intent analysis"
            );
        }

        let embedder = if options.no_embeddings {
            None
        } else {
            load_embedder(&data_dir).await
        };

        Ok(Self::from_parts(
            repository, key_store, config, shared_key, embedder, data_dir,
        ))
    }

    /// Wire the recommender from already-built adapters.
    pub fn from_parts(
        repository: InMemoryContentRepository,
        key_store: SqliteUserKeyStore,
        config: RecommenderConfig,
        shared_key: Option<Redacted>,
        embedder: Option<FastEmbedder>,
        data_dir: PathBuf,
    ) -> Self {
        let quota = QuotaManager::new(MemoryCounterStore::new(), config.quota.clone());
        let gateway = LlmGateway::new(
            key_store,
            HttpProviderFactory::new(&config.llm),
            quota,
            &config,
            shared_key,
        );
        let embedder = embedder.map(|e| {
            Arc::new(CachingEmbedder::new(
                BoxEmbedder::new(e),
                config.embedding.cache_capacity,
                Duration::from_millis(config.timeouts.embedding_ms),
            ))
        });
        let recommender = Recommender::new(
            repository,
            MemoryCacheStore::new(),
            Arc::new(gateway),
            embedder,
            config,
        );

        Self {
            recommender: Arc::new(recommender),
            data_dir,
        }
    }

    /// Periodically drop idle LLM clients and expired cache entries.
    ///
    /// Both stores also expire lazily on access; the sweep only bounds
    /// memory for users who stop sending requests.
    pub fn spawn_maintenance(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let recommender = Arc::clone(&self.recommender);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let clients = recommender.gateway().pool().evict_idle();
                let entries = recommender.cache_store().purge_expired();
                if clients > 0 || entries > 0 {
                    tracing::debug!(clients, entries, "maintenance sweep");
                }
            }
        })
    }
}

/// Load the embedding model off the async threads. A failure disables the
/// semantic engines instead of aborting startup.
async fn load_embedder(data_dir: &Path) -> Option<FastEmbedder> {
    let cache_dir = data_dir.join("models");
    match tokio::task::spawn_blocking(move || FastEmbedder::new(cache_dir)).await {
        Ok(Ok(embedder)) => Some(embedder),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "embedding model unavailable, semantic engines disabled");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "embedding model loader panicked");
            None
        }
    }
}
