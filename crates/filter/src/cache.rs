//! Compiled-program cache: `librarian_core`'s generic LRU, keyed by the
//! exact filter source string (spec §4.5).

use librarian_core::cache::{ProgramCache, DEFAULT_CAPACITY};

use crate::compile::{compile, Program};
use crate::error::CompileError;

pub struct FilterCache {
    inner: ProgramCache<Program>,
}

impl FilterCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: ProgramCache::new(capacity),
        }
    }

    /// Returns the cached program for `source` if present, otherwise
    /// compiles it, caches it, and returns the fresh copy.
    pub async fn get_or_compile(&self, source: &str) -> Result<Program, CompileError> {
        if let Some(program) = self.inner.get(source).await {
            return Ok(program);
        }
        let program = compile(source)?;
        self.inner.put(source.to_string(), program.clone()).await;
        Ok(program)
    }

    pub async fn clear(&self) {
        self.inner.clear().await;
    }

    pub async fn size(&self) -> usize {
        self.inner.size().await
    }
}

impl Default for FilterCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
