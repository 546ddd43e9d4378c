use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::assets::decode::LoadedImage;
use crate::assets::loader::AssetLoader;
use crate::assets::lru::{Lookup, LruTtlCache};
use crate::foundation::error::{CardError, CardResult};
use crate::layout::node::LayoutNode;

/// Cache configuration.
#[derive(Clone, Copy, Debug)]
pub struct AssetCacheOpts {
    /// Maximum number of decoded images retained.
    pub capacity: usize,
    /// Absolute age after which an entry is treated as absent. `None` disables expiry.
    pub ttl: Option<Duration>,
}

impl Default for AssetCacheOpts {
    fn default() -> Self {
        Self {
            capacity: 256,
            ttl: None,
        }
    }
}

/// Counters for observing cache behavior.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetCacheStats {
    /// Reads served from the cache.
    pub hits: u64,
    /// Reads that started a new load.
    pub misses: u64,
    /// Calls into the underlying loader.
    pub loads: u64,
    /// Reads that waited on another caller's in-flight load.
    pub joined: u64,
    /// Reads rejected from the error map without loading.
    pub fail_fast: u64,
    /// Entries dropped for capacity.
    pub evictions: u64,
    /// Entries dropped for age.
    pub expirations: u64,
    /// Entries currently retained.
    pub entries: usize,
    /// Keys currently in the error map.
    pub errors: usize,
}

/// One tolerated failure from [`AssetCache::load_many`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct AssetFailure {
    /// Source key that failed.
    pub url: String,
    /// Failure reason.
    pub error: String,
}

/// Result of a bulk load.
#[derive(Clone, Debug, Default)]
pub struct LoadReport {
    /// Successfully loaded images keyed by source.
    pub loaded: BTreeMap<String, Arc<LoadedImage>>,
    /// Failures, present only when errors are tolerated.
    pub errors: Vec<AssetFailure>,
}

type Settled = Result<Arc<LoadedImage>, String>;

#[derive(Default)]
struct InFlight {
    slot: Mutex<Option<Settled>>,
    ready: Condvar,
}

impl InFlight {
    fn settle(&self, result: Settled) {
        let mut slot = lock(&self.slot);
        if slot.is_none() {
            *slot = Some(result);
        }
        self.ready.notify_all();
    }

    fn wait(&self) -> Settled {
        let mut slot = lock(&self.slot);
        loop {
            if let Some(res) = slot.as_ref() {
                return res.clone();
            }
            slot = self.ready.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

struct State {
    entries: LruTtlCache<String, Arc<LoadedImage>>,
    errors: HashMap<String, String>,
    in_flight: HashMap<String, Arc<InFlight>>,
    stats: AssetCacheStats,
}

/// Decoded-image cache with load deduplication and sticky errors.
///
/// A `load` is served, in order, from: the cache; an in-flight load of the same key (the caller
/// blocks until it settles); the error map (fails fast); a fresh call into the [`AssetLoader`].
/// Remembered errors persist until the key loads successfully or is cleared explicitly.
pub struct AssetCache {
    loader: Arc<dyn AssetLoader>,
    state: Mutex<State>,
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

// Removes the in-flight entry when the load settles, including by panic.
struct FlightGuard<'a> {
    cache: &'a AssetCache,
    key: &'a str,
    flight: Arc<InFlight>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        {
            let mut st = self.cache.state();
            if st
                .in_flight
                .get(self.key)
                .is_some_and(|f| Arc::ptr_eq(f, &self.flight))
            {
                st.in_flight.remove(self.key);
            }
        }
        // No-op unless the loader unwound before settling.
        self.flight
            .settle(Err("asset loader panicked".to_owned()));
    }
}

impl AssetCache {
    pub fn new(opts: AssetCacheOpts, loader: Arc<dyn AssetLoader>) -> Self {
        Self {
            loader,
            state: Mutex::new(State {
                entries: LruTtlCache::new(opts.capacity, opts.ttl),
                errors: HashMap::new(),
                in_flight: HashMap::new(),
                stats: AssetCacheStats::default(),
            }),
        }
    }

    /// Convenience constructor taking the loader by value.
    pub fn with_loader(opts: AssetCacheOpts, loader: impl AssetLoader + 'static) -> Self {
        Self::new(opts, Arc::new(loader))
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }

    /// Load `key`, sharing any concurrent load of the same key.
    pub fn load(&self, key: &str) -> CardResult<Arc<LoadedImage>> {
        let flight = {
            let mut st = self.state();
            match st.entries.get(&key.to_owned(), Instant::now()) {
                Lookup::Hit(img) => {
                    st.stats.hits += 1;
                    tracing::debug!(key, "asset cache hit");
                    return Ok(img);
                }
                Lookup::Expired => st.stats.expirations += 1,
                Lookup::Miss => {}
            }
            if let Some(existing) = st.in_flight.get(key).cloned() {
                st.stats.joined += 1;
                drop(st);
                tracing::debug!(key, "joining in-flight asset load");
                return existing.wait().map_err(|reason| CardError::asset(key, reason));
            }
            if let Some(reason) = st.errors.get(key) {
                let err = CardError::asset(key, reason.clone());
                st.stats.fail_fast += 1;
                return Err(err);
            }
            st.stats.misses += 1;
            st.stats.loads += 1;
            let flight = Arc::new(InFlight::default());
            st.in_flight.insert(key.to_owned(), flight.clone());
            flight
        };

        let guard = FlightGuard {
            cache: self,
            key,
            flight,
        };
        tracing::debug!(key, "asset cache miss; loading");
        let result: Settled = self
            .loader
            .load(key)
            .map(Arc::new)
            .map_err(|e| failure_reason(key, e));

        {
            let mut st = self.state();
            match &result {
                Ok(img) => {
                    st.errors.remove(key);
                    let (evicted, expired) =
                        st.entries.insert(key.to_owned(), img.clone(), Instant::now());
                    st.stats.evictions += evicted;
                    st.stats.expirations += expired;
                }
                Err(reason) => {
                    st.errors.insert(key.to_owned(), reason.clone());
                }
            }
        }
        guard.flight.settle(result.clone());
        drop(guard);

        result.map_err(|reason| CardError::asset(key, reason))
    }

    /// Load every distinct key in parallel.
    ///
    /// With `throw_on_error`, the first failure aborts the call. Otherwise failures are collected
    /// into [`LoadReport::errors`] and the rest still load.
    pub fn load_many<S: AsRef<str>>(
        &self,
        keys: &[S],
        throw_on_error: bool,
    ) -> CardResult<LoadReport> {
        let mut unique: Vec<&str> = Vec::with_capacity(keys.len());
        for k in keys {
            let k = k.as_ref();
            if !unique.contains(&k) {
                unique.push(k);
            }
        }

        let mut report = LoadReport::default();
        if throw_on_error {
            let loaded = unique
                .par_iter()
                .map(|k| self.load(k).map(|img| ((*k).to_owned(), img)))
                .collect::<CardResult<Vec<_>>>()?;
            report.loaded.extend(loaded);
            return Ok(report);
        }

        let results: Vec<(&str, CardResult<Arc<LoadedImage>>)> =
            unique.par_iter().map(|k| (*k, self.load(k))).collect();
        for (k, res) in results {
            match res {
                Ok(img) => {
                    report.loaded.insert(k.to_owned(), img);
                }
                Err(e) => {
                    let error = match e {
                        CardError::Asset { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    tracing::warn!(url = k, error = %error, "tolerating asset failure");
                    report.errors.push(AssetFailure {
                        url: k.to_owned(),
                        error,
                    });
                }
            }
        }
        Ok(report)
    }

    /// Load every image referenced by `root` (`props.src`, `props.avatar`, `props.image`).
    #[tracing::instrument(skip_all, fields(throw_on_error = throw_on_error))]
    pub fn preload_from_layout(
        &self,
        root: &LayoutNode,
        throw_on_error: bool,
    ) -> CardResult<LoadReport> {
        let keys = crate::layout::parse::extract_assets(root);
        tracing::debug!(count = keys.len(), "preloading layout assets");
        self.load_many(&keys, throw_on_error)
    }

    /// Cached value for `key` without loading or touching recency.
    pub fn peek(&self, key: &str) -> Option<Arc<LoadedImage>> {
        self.state().entries.peek(&key.to_owned(), Instant::now())
    }

    /// Remembered failure reason for `key`.
    pub fn error_for(&self, key: &str) -> Option<String> {
        self.state().errors.get(key).cloned()
    }

    /// Forget the remembered failure for `key`. Returns `true` when one was present.
    pub fn clear_error(&self, key: &str) -> bool {
        self.state().errors.remove(key).is_some()
    }

    /// Forget every remembered failure.
    pub fn clear_errors(&self) {
        self.state().errors.clear();
    }

    /// Drop all cached entries and remembered failures. In-flight loads are left to settle.
    pub fn clear(&self) {
        let mut st = self.state();
        st.entries.clear();
        st.errors.clear();
    }

    pub fn stats(&self) -> AssetCacheStats {
        let st = self.state();
        AssetCacheStats {
            entries: st.entries.len(),
            errors: st.errors.len(),
            ..st.stats.clone()
        }
    }
}

fn failure_reason(key: &str, err: CardError) -> String {
    match err {
        CardError::Asset { url, reason } if url == key => reason,
        other => other.to_string(),
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
