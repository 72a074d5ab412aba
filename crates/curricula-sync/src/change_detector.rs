use chrono::Utc;
use curricula_core::{CurriculumId, FileChangeKind, FileChangeRecord, KeyValueStore, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const FINGERPRINT_NAMESPACE: &str = "curricula:fingerprints";

/// sha256 hex digest of artifact content.
pub fn fingerprint(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Per-artifact fingerprints from the last successful reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FingerprintSnapshot {
    pub fingerprints: BTreeMap<String, String>,
}

/// Detected changes plus the snapshot to persist once the batch that
/// consumed them succeeds.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub records: Vec<FileChangeRecord>,
    pub snapshot: FingerprintSnapshot,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Roll the snapshot back to the prior fingerprint for `paths`. Used
    /// for units whose regeneration failed: persisting their new
    /// fingerprint would make the failure permanent, since the next run
    /// would read the artifact as unchanged and never retry.
    pub fn revert_paths(&mut self, paths: &[String]) {
        for path in paths {
            let Some(record) = self.records.iter().find(|r| r.path == *path) else {
                continue;
            };
            match &record.old_fingerprint {
                Some(old) => {
                    self.snapshot
                        .fingerprints
                        .insert(path.clone(), old.clone());
                }
                None => {
                    self.snapshot.fingerprints.remove(path);
                }
            }
        }
    }
}

/// Classifies artifact changes against the fingerprint state persisted by
/// the prior reconciliation. Store unavailability degrades to "no prior
/// state" (everything reads as added); unreadable files read as deleted.
pub struct ChangeDetector<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    async fn load_snapshot(&self, curriculum_id: CurriculumId) -> FingerprintSnapshot {
        let raw = match self
            .store
            .get(FINGERPRINT_NAMESPACE, &curriculum_id.to_string())
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "fingerprint store unavailable; treating as no prior state");
                None
            }
        };
        match raw {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "fingerprint snapshot corrupt; treating as no prior state");
                FingerprintSnapshot::default()
            }),
            None => FingerprintSnapshot::default(),
        }
    }

    /// Compare current content of `paths` against the prior snapshot.
    /// Unchanged paths are omitted from the result.
    pub async fn detect(
        &self,
        curriculum_id: CurriculumId,
        paths: &[String],
    ) -> Result<ChangeSet> {
        let prior = self.load_snapshot(curriculum_id).await;
        let mut current: BTreeMap<String, String> = BTreeMap::new();
        for path in paths {
            match tokio::fs::read(path).await {
                Ok(bytes) => {
                    current.insert(path.clone(), fingerprint(&bytes));
                }
                Err(e) => {
                    // unreadable counts as deleted, never as a failure
                    debug!(path = %path, error = %e, "artifact unreadable; treating as deleted");
                }
            }
        }
        Ok(self.classify(prior, current))
    }

    /// Classification over already-computed fingerprints; the pure core of
    /// `detect`, also used when callers fingerprint content themselves.
    pub fn classify_fingerprints(
        &self,
        prior: FingerprintSnapshot,
        current: BTreeMap<String, String>,
    ) -> ChangeSet {
        self.classify(prior, current)
    }

    fn classify(
        &self,
        prior: FingerprintSnapshot,
        current: BTreeMap<String, String>,
    ) -> ChangeSet {
        let now = Utc::now();
        let mut records = Vec::new();

        for (path, new_fp) in &current {
            match prior.fingerprints.get(path) {
                None => records.push(FileChangeRecord {
                    path: path.clone(),
                    kind: FileChangeKind::Added,
                    old_fingerprint: None,
                    new_fingerprint: Some(new_fp.clone()),
                    detected_at: now,
                }),
                Some(old_fp) if old_fp != new_fp => records.push(FileChangeRecord {
                    path: path.clone(),
                    kind: FileChangeKind::Modified,
                    old_fingerprint: Some(old_fp.clone()),
                    new_fingerprint: Some(new_fp.clone()),
                    detected_at: now,
                }),
                Some(_) => {} // unchanged paths are omitted
            }
        }
        for (path, old_fp) in &prior.fingerprints {
            if !current.contains_key(path) {
                records.push(FileChangeRecord {
                    path: path.clone(),
                    kind: FileChangeKind::Deleted,
                    old_fingerprint: Some(old_fp.clone()),
                    new_fingerprint: None,
                    detected_at: now,
                });
            }
        }

        ChangeSet {
            records,
            snapshot: FingerprintSnapshot {
                fingerprints: current,
            },
        }
    }

    /// Persist the snapshot for the next run. Called only after the batch
    /// that consumed the change set succeeds.
    pub async fn persist_snapshot(
        &self,
        curriculum_id: CurriculumId,
        snapshot: &FingerprintSnapshot,
    ) -> Result<()> {
        let raw = serde_json::to_string(snapshot)?;
        self.store
            .set(FINGERPRINT_NAMESPACE, &curriculum_id.to_string(), raw, None)
            .await
    }
}
