use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use crate::sources::CdnSource;
use crate::{FetchResult, RuntimeAssetKind, RuntimeAssetSource};

type CacheKey = (String, RuntimeAssetKind);
type Entry = Arc<OnceCell<Arc<Vec<u8>>>>;

/// Memoizes runtime-asset downloads per `(version, kind)`.
///
/// Callers racing on the same key share one in-flight fetch. A successful fetch
/// stays cached for the life of the cache; a failed one is evicted so the next
/// call goes back to the source.
pub struct RuntimeAssetCache {
    source: Arc<dyn RuntimeAssetSource>,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl RuntimeAssetCache {
    pub fn new(source: Arc<dyn RuntimeAssetSource>) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide cache backed by the default CDN.
    pub fn shared() -> Arc<RuntimeAssetCache> {
        static SHARED: OnceLock<Arc<RuntimeAssetCache>> = OnceLock::new();
        SHARED
            .get_or_init(|| Arc::new(RuntimeAssetCache::new(Arc::new(CdnSource::default()))))
            .clone()
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub async fn get(&self, version: &str, kind: RuntimeAssetKind) -> FetchResult<Arc<Vec<u8>>> {
        let key: CacheKey = (version.to_string(), kind);
        let entry = self.entry(&key);

        let result = entry
            .get_or_try_init(|| async {
                debug!(version, %kind, source = self.source.name(), "Runtime asset cache miss");
                self.source.fetch(version, kind).await.map(Arc::new)
            })
            .await;

        match result {
            Ok(bytes) => Ok(bytes.clone()),
            Err(e) => {
                warn!(version, %kind, error = %e, "Runtime asset fetch failed, evicting cache entry");
                self.evict(&key, &entry);
                Err(e)
            }
        }
    }

    /// Whether a successful fetch for this key is currently memoized.
    pub fn is_cached(&self, version: &str, kind: RuntimeAssetKind) -> bool {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&(version.to_string(), kind))
            .is_some_and(|cell| cell.initialized())
    }

    /// Number of keys with an entry, in flight or resolved.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, key: &CacheKey) -> Entry {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    fn evict(&self, key: &CacheKey, failed: &Entry) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        // Another caller may already have replaced the entry and succeeded.
        if entries
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, failed) && !current.initialized())
        {
            entries.remove(key);
        }
    }
}
