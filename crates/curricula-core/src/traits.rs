use crate::{ContentFields, ContentUnit, FileAnalysis, Result};
use async_trait::async_trait;
use std::time::Duration;

/// External code-analysis step. Produces patterns, import evidence and
/// heuristic scores for one artifact path.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, path: &str) -> Result<FileAnalysis>;
}

/// External prose generator, invoked once per changed unit during
/// reconciliation. Opaque and possibly failing.
#[async_trait]
pub trait ContentRegenerator: Send + Sync {
    async fn regenerate(&self, unit: &ContentUnit, analysis: &FileAnalysis)
        -> Result<ContentFields>;
}

/// Namespaced durable get/set with TTL semantics. The engine persists
/// fingerprint state and the version ledger through this seam and assumes
/// eventual consistency is acceptable.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>>;
    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<()>;
    async fn delete(&self, namespace: &str, key: &str) -> Result<()>;
}
