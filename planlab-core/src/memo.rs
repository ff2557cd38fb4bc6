//! Injectable memoization decorator for the pipeline.
//!
//! Wrap an `AnalysisPipeline` when the same input may be analyzed repeatedly
//! (e.g. several narrative queries against one candle close). Keys are the
//! BLAKE3 hash of the serialized input; entries expire after the configured
//! TTL. Explicit and owned by the caller — no ambient global cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::{AnalysisError, AnalysisResult};
use crate::pipeline::{AnalysisInput, AnalysisPipeline, AnalysisReport};

pub struct MemoizedPipeline {
    inner: AnalysisPipeline,
    ttl: Duration,
    cache: Mutex<HashMap<[u8; 32], (Instant, AnalysisReport)>>,
}

impl MemoizedPipeline {
    /// TTL comes from the pipeline's own `memo` config section.
    pub fn new(inner: AnalysisPipeline) -> Self {
        let ttl = Duration::from_secs(inner.config().memo.ttl_secs);
        Self::with_ttl(inner, ttl)
    }

    pub fn with_ttl(inner: AnalysisPipeline, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped pipeline, for training calls and stats snapshots.
    pub fn inner(&self) -> &AnalysisPipeline {
        &self.inner
    }

    pub fn analyze(&self, input: &AnalysisInput) -> AnalysisResult<AnalysisReport> {
        let key = input_key(input)?;

        {
            let mut cache = self.lock();
            cache.retain(|_, (at, _)| at.elapsed() < self.ttl);
            if let Some((_, report)) = cache.get(&key) {
                tracing::debug!(symbol = %input.symbol, "memoized report served");
                return Ok(report.clone());
            }
        }

        // Compute outside the lock; concurrent misses for the same key just
        // do the work twice and agree on the value.
        let report = self.inner.analyze(input)?;
        self.lock().insert(key, (Instant::now(), report.clone()));
        Ok(report)
    }

    /// Entries currently held (fresh or not yet purged).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<[u8; 32], (Instant, AnalysisReport)>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn input_key(input: &AnalysisInput) -> AnalysisResult<[u8; 32]> {
    let bytes = serde_json::to_vec(input)
        .map_err(|e| AnalysisError::InvalidConfig(format!("input not hashable: {e}")))?;
    Ok(*blake3::hash(&bytes).as_bytes())
}
