//! Keyed storage of trained models.

use std::fmt::{Display, Formatter};
use std::ops::AddAssign;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An inclusive range of seasons, identified by their starting year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub first: u16,
    pub last: u16,
}
impl SeasonWindow {
    pub fn single(season: u16) -> Self {
        Self {
            first: season,
            last: season,
        }
    }

    pub fn contains(&self, season: u16) -> bool {
        (self.first..=self.last).contains(&season)
    }
}

impl Display for SeasonWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryKey {
    pub competition: String,
    pub seasons: SeasonWindow,
    /// Rolling window the model's features were built with.
    pub window: usize,
}

impl Display for RegistryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/N={}", self.competition, self.seasons, self.window)
    }
}

pub trait ModelRegistry<M> {
    fn get(&self, key: &RegistryKey) -> Option<Arc<M>>;

    /// Stores a model, replacing any previous model under the same key.
    fn put(&self, key: RegistryKey, model: M) -> Arc<M>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    hits: usize,
    misses: usize,
}
impl CacheStats {
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

impl AddAssign<bool> for CacheStats {
    fn add_assign(&mut self, cache_hit: bool) {
        if cache_hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }
}

struct Inner<M> {
    models: FxHashMap<RegistryKey, Arc<M>>,
    stats: CacheStats,
}

/// A registry held in memory behind a single mutex.
pub struct InMemoryRegistry<M> {
    inner: Mutex<Inner<M>>,
}
impl<M> InMemoryRegistry<M> {
    fn lock(&self) -> MutexGuard<'_, Inner<M>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the model under `key`, building and storing it first if absent. A failed build
    /// stores nothing. The registry stays locked while building, so concurrent callers asking for
    /// the same key build it once.
    pub fn get_or_insert_with<E>(&self, key: RegistryKey, build: impl FnOnce() -> Result<M, E>) -> Result<Arc<M>, E> {
        let mut inner = self.lock();
        if let Some(model) = inner.models.get(&key) {
            let model = model.clone();
            inner.stats += true;
            return Ok(model);
        }
        inner.stats += false;
        debug!("building model for {key}");
        let model = Arc::new(build()?);
        inner.models.insert(key, model.clone());
        Ok(model)
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    pub fn len(&self) -> usize {
        self.lock().models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().models.is_empty()
    }
}

impl<M> Default for InMemoryRegistry<M> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                models: FxHashMap::default(),
                stats: CacheStats::default(),
            }),
        }
    }
}

impl<M> ModelRegistry<M> for InMemoryRegistry<M> {
    fn get(&self, key: &RegistryKey) -> Option<Arc<M>> {
        self.lock().models.get(key).cloned()
    }

    fn put(&self, key: RegistryKey, model: M) -> Arc<M> {
        let model = Arc::new(model);
        self.lock().models.insert(key, model.clone());
        model
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    fn key(window: usize) -> RegistryKey {
        RegistryKey {
            competition: "PL".into(),
            seasons: SeasonWindow { first: 2023, last: 2024 },
            window,
        }
    }

    #[test]
    fn put_and_get() {
        let registry = InMemoryRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(None, registry.get(&key(5)));
        registry.put(key(5), "five");
        registry.put(key(3), "three");
        assert_eq!(Some(Arc::new("five")), registry.get(&key(5)));
        assert_eq!(Some(Arc::new("three")), registry.get(&key(3)));

        registry.put(key(5), "replaced");
        assert_eq!(Some(Arc::new("replaced")), registry.get(&key(5)));
        assert_eq!(2, registry.len());
    }

    #[test]
    fn get_or_insert_with_counts_hits() {
        let registry = InMemoryRegistry::default();
        let built: Result<_, ()> = registry.get_or_insert_with(key(5), || Ok(42));
        assert_eq!(Ok(Arc::new(42)), built);
        let cached: Result<_, ()> = registry.get_or_insert_with(key(5), || panic!("rebuilt"));
        assert_eq!(Ok(Arc::new(42)), cached);
        assert_eq!(1, registry.stats().hits());
        assert_eq!(1, registry.stats().misses());
    }

    #[test]
    fn failed_builds_are_not_stored() {
        let registry = InMemoryRegistry::<u32>::default();
        assert_eq!(Err("no data"), registry.get_or_insert_with(key(5), || Err("no data")));
        assert!(registry.is_empty());
        assert_eq!(Ok(Arc::new(7)), registry.get_or_insert_with::<()>(key(5), || Ok(7)));
    }

    #[test]
    fn concurrent_callers_build_once() {
        let registry = InMemoryRegistry::default();
        let builds = AtomicUsize::new(0);
        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let model: Result<_, ()> = registry.get_or_insert_with(key(5), || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Ok("model")
                    });
                    assert_eq!(Ok(Arc::new("model")), model);
                });
            }
        });
        assert_eq!(1, builds.load(Ordering::SeqCst));
        assert_eq!(7, registry.stats().hits());
    }

    #[test]
    fn display() {
        assert_eq!("PL/2023-2024/N=5", key(5).to_string());
        assert_eq!("2024", SeasonWindow::single(2024).to_string());
        assert!(SeasonWindow { first: 2022, last: 2024 }.contains(2023));
        assert!(!SeasonWindow::single(2024).contains(2023));
    }
}
