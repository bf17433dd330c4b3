//! The compiled-expression cache.
//!
//! A bounded LRU keyed by the expression source, behind a mutex — the
//! only shared mutable state in the engine. Concurrent misses may both
//! compile; compilation is deterministic, so the last writer wins.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use crate::compile::{compile, Compiled};
use crate::error::Result;

pub(crate) const DEFAULT_CAPACITY: usize = 256;

pub(crate) struct QueryCache {
    inner: Mutex<LruCache<String, Arc<Compiled>>>,
}

impl QueryCache {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        QueryCache {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub(crate) fn get_or_compile(&self, source: &str) -> Result<Arc<Compiled>> {
        if let Some(hit) = self.lock().get(source) {
            return Ok(hit.clone());
        }
        let ast = xylem_xpath_ast::parse(source)?;
        let compiled = Arc::new(compile(&ast));
        log::debug!("compiled xpath expression: {source}");
        self.lock().put(source.to_string(), compiled.clone());
        Ok(compiled)
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<Compiled>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
