use chrono::Utc;
use curricula_core::{
    CurriculumId, FileChangeKind, FileChangeRecord, KeyValueStore, Result, SemanticVersion,
    UnitChangeKind, UnitChangeRecord, VersionEntry,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const LEDGER_NAMESPACE: &str = "curricula:ledger";

/// Append-only history of reconciliation outcomes for one curriculum.
/// Entries are immutable once appended; versions increase monotonically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionLedger {
    pub curriculum_id: CurriculumId,
    entries: Vec<VersionEntry>,
}

impl VersionLedger {
    pub fn new(curriculum_id: CurriculumId) -> Self {
        Self {
            curriculum_id,
            entries: Vec::new(),
        }
    }

    /// Version of the most recent entry, or the 1.0.0 baseline.
    pub fn current_version(&self) -> SemanticVersion {
        self.entries
            .last()
            .map(|e| e.version)
            .unwrap_or_default()
    }

    /// Entries newest-first.
    pub fn entries(&self) -> impl Iterator<Item = &VersionEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bump the version (minor when the change count exceeds the threshold,
    /// patch otherwise), build the entry with a generated summary, and
    /// append it.
    pub fn record(
        &mut self,
        unit_changes: Vec<UnitChangeRecord>,
        file_changes: Vec<FileChangeRecord>,
        total_units: usize,
        bump_threshold: usize,
    ) -> &VersionEntry {
        let change_count = unit_changes.len();
        let version = if change_count > bump_threshold {
            self.current_version().bump_minor()
        } else {
            self.current_version().bump_patch()
        };

        let updated_units = unit_changes
            .iter()
            .filter(|c| c.kind == UnitChangeKind::Content && !c.failed)
            .count();
        let failed_units = unit_changes.iter().filter(|c| c.failed).count();
        let archived_units = unit_changes
            .iter()
            .filter(|c| c.kind == UnitChangeKind::Archived)
            .count();
        let summary = summarize(updated_units, failed_units, archived_units, &file_changes);

        info!(version = %version, %summary, "appending version entry");
        self.entries.push(VersionEntry {
            version,
            created_at: Utc::now(),
            summary,
            unit_changes,
            file_changes,
            total_units,
            updated_units,
            archived_units,
        });
        self.entries.last().expect("entry just appended")
    }

    pub async fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        let raw = serde_json::to_string(self)?;
        store
            .set(LEDGER_NAMESPACE, &self.curriculum_id.to_string(), raw, None)
            .await
    }

    /// Load the ledger for a curriculum; store unavailability or a corrupt
    /// payload yields an empty ledger at the 1.0.0 baseline.
    pub async fn load(store: &dyn KeyValueStore, curriculum_id: CurriculumId) -> Self {
        let raw = match store
            .get(LEDGER_NAMESPACE, &curriculum_id.to_string())
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "ledger store unavailable; starting from empty ledger");
                None
            }
        };
        match raw {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "ledger payload corrupt; starting from empty ledger");
                Self::new(curriculum_id)
            }),
            None => Self::new(curriculum_id),
        }
    }
}

fn summarize(
    updated: usize,
    failed: usize,
    archived: usize,
    file_changes: &[FileChangeRecord],
) -> String {
    let count = |kind: FileChangeKind| file_changes.iter().filter(|c| c.kind == kind).count();
    format!(
        "{} updated, {} failed, {} archived; files: {} added, {} modified, {} deleted",
        updated,
        failed,
        archived,
        count(FileChangeKind::Added),
        count(FileChangeKind::Modified),
        count(FileChangeKind::Deleted),
    )
}
