use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::db::kv::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, StorageResult};
use crate::db::pool::{get_db_pool, PgKeyValueStore};
use crate::services::store::{ServiceRequestStore, StoreOptions};
use crate::services::tracker::StatusTracker;
use crate::utils::notification::InMemoryNotificationCenter;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ServiceRequestStore>,
    pub tracker: Arc<StatusTracker>,
    pub notifications: Arc<InMemoryNotificationCenter>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Opens the store and tracker on top of `persistence`.
    pub async fn new(config: Config, persistence: Arc<dyn KeyValueStore>) -> Self {
        let notifications = Arc::new(InMemoryNotificationCenter::default());
        let store = Arc::new(
            ServiceRequestStore::open(
                persistence.clone(),
                notifications.clone(),
                StoreOptions {
                    seed_sample_data: config.seed_sample_data,
                    ..StoreOptions::default()
                },
            )
            .await,
        );
        let tracker = Arc::new(StatusTracker::open(store.clone(), persistence).await);

        Self {
            store,
            tracker,
            notifications,
            config: Arc::new(config),
        }
    }
}

/// Builds the key-value backend selected in the config.
pub async fn open_persistence(config: &Config) -> StorageResult<Arc<dyn KeyValueStore>> {
    let persistence: Arc<dyn KeyValueStore> = match config.storage_backend {
        StorageBackend::Memory => Arc::new(InMemoryKeyValueStore::new()),
        StorageBackend::File => Arc::new(FileKeyValueStore::new(&config.storage_dir)),
        StorageBackend::Postgres => {
            // Config validation guarantees the URL is present for this backend.
            let url = config.database_url.as_deref().unwrap_or_default();
            let pool = get_db_pool(url).await?;
            Arc::new(PgKeyValueStore::new(pool).await?)
        }
    };
    Ok(persistence)
}
