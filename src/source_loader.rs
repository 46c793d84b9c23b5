//! Loading of source tables, with caching.

use crate::compression::{self, Compression};
use crate::error::PivotError;
use crate::resource_manager::ResourceManager;
use crate::source_cache::SourceCache;
use crate::source_store::{check_size, Source, SourceFetcher, SourceStore};
use crate::table::Table;

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Loads source tables, keeping each one in a cache after its first successful load.
///
/// The cache key is the source location exactly as given: no normalisation is applied, so two
/// spellings of the same location are cached separately.
#[derive(Debug)]
pub struct SourceLoader {
    /// Fetcher for raw source data
    fetcher: Box<dyn SourceFetcher>,
    /// Parsed tables keyed by location
    cache: Mutex<SourceCache>,
    /// Number of fetches performed
    fetches: AtomicUsize,
    /// Optional maximum size in bytes of fetched source data
    size_limit: Option<u64>,
}

impl SourceLoader {
    /// Returns a new SourceLoader.
    ///
    /// # Arguments
    ///
    /// * `fetcher`: Fetcher for raw source data
    /// * `cache`: Source cache
    /// * `size_limit`: Optional maximum size in bytes of fetched source data
    pub fn new(fetcher: Box<dyn SourceFetcher>, cache: SourceCache, size_limit: Option<u64>) -> Self {
        Self {
            fetcher,
            cache: Mutex::new(cache),
            fetches: AtomicUsize::new(0),
            size_limit,
        }
    }

    /// Returns a SourceLoader fetching over HTTP(S) and from local files.
    ///
    /// # Arguments
    ///
    /// * `cache_size`: Optional maximum number of cached sources
    /// * `cache_ttl`: Optional time to live of cached sources in seconds
    /// * `size_limit`: Optional maximum size in bytes of fetched source data
    pub fn with_store(
        cache_size: Option<NonZeroUsize>,
        cache_ttl: Option<u64>,
        size_limit: Option<u64>,
    ) -> Self {
        Self::new(
            Box::new(SourceStore::new()),
            SourceCache::new(cache_size, cache_ttl),
            size_limit,
        )
    }

    /// Load the table at `location`.
    ///
    /// The first load of a location fetches and parses it. Later loads return the cached table.
    /// Concurrent first loads of the same location share a single fetch. Failures are not cached.
    ///
    /// # Arguments
    ///
    /// * `location`: HTTP(S) URL, file URL or local path
    /// * `resource_manager`: ResourceManager object
    #[tracing::instrument(level = "DEBUG", skip(self, resource_manager))]
    pub async fn load(
        &self,
        location: &str,
        resource_manager: &ResourceManager,
    ) -> Result<Arc<Table>, PivotError> {
        let slot = self.lock_cache()?.slot(location);
        if let Some(table) = slot.get() {
            tracing::debug!("source cache hit");
            return Ok(table.clone());
        }
        let result = slot
            .get_or_try_init(|| async {
                tracing::debug!("source cache miss");
                let table = self.fetch_table(location, resource_manager).await?;
                Ok::<_, PivotError>(Arc::new(table))
            })
            .await;
        match result {
            Ok(table) => Ok(table.clone()),
            Err(err) => {
                // Don't let failed locations take up cache capacity.
                self.lock_cache()?.remove_empty(location);
                Err(err)
            }
        }
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, SourceCache>, PivotError> {
        self.cache.lock().map_err(|err| PivotError::CacheError {
            error: err.to_string(),
        })
    }

    /// Fetch, decompress and parse a source.
    async fn fetch_table(
        &self,
        location: &str,
        resource_manager: &ResourceManager,
    ) -> Result<Table, PivotError> {
        let source = Source::parse(location)?;
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let data = self
            .fetcher
            .fetch(&source, resource_manager, self.size_limit)
            .await?;
        check_size(u64::try_from(data.len())?, self.size_limit)?;
        let data = match Compression::infer(location) {
            Some(compression) => compression::decompress(compression, &data, self.size_limit)?,
            None => data,
        };
        let table = Table::from_json(&data)?;
        tracing::info!(
            "loaded source {} with {} fields and {} rows",
            location,
            table.fields().len(),
            table.num_rows()
        );
        Ok(table)
    }

    /// Number of fetches performed so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}
