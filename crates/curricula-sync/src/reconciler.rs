use crate::ledger::VersionLedger;
use chrono::Utc;
use curricula_core::{
    AnalysisProvider, ArchivedUnit, ContentFields, ContentRegenerator, ContentUnit, Curriculum,
    CurriculumConfig, FileAnalysis, FileChangeKind, FileChangeRecord, ManualEditRegistry, Result,
    UnitChangeKind, UnitChangeRecord, UnitId, VersionEntry,
};
use curricula_sequencer::{difficulty_from_complexity, estimate_duration};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Outcome of one reconciliation batch. Partial success is communicated
/// through data: the entry lists what changed, `failed_paths` what could
/// not be regenerated, `skipped_paths` what had no matching unit.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub entry: VersionEntry,
    pub failed_paths: Vec<String>,
    pub skipped_paths: Vec<String>,
}

struct RegenTask {
    unit_id: UnitId,
    path: String,
    unit: ContentUnit,
}

struct RegenResult {
    unit_id: UnitId,
    path: String,
    outcome: std::result::Result<(ContentFields, FileAnalysis), String>,
}

const PROSE_FIELDS: [&str; 4] = ["title", "summary", "introduction", "walkthrough"];

/// Applies an artifact change set to a curriculum: regenerates affected
/// units (bounded fan-out), merges around manual edits, archives units
/// whose artifacts are gone, and appends one version entry per batch.
/// A single writer per curriculum is assumed; the `&mut Curriculum`
/// receiver enforces it in-process.
pub struct Reconciler {
    config: CurriculumConfig,
}

impl Reconciler {
    pub fn new(config: CurriculumConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub async fn reconcile(
        &self,
        curriculum: &mut Curriculum,
        changes: &[FileChangeRecord],
        registry: &ManualEditRegistry,
        provider: &dyn AnalysisProvider,
        regenerator: &dyn ContentRegenerator,
        ledger: &mut VersionLedger,
    ) -> Result<ReconcileOutcome> {
        let mut skipped_paths = Vec::new();
        let mut to_archive: Vec<(UnitId, String)> = Vec::new();
        let mut tasks: Vec<RegenTask> = Vec::new();

        for change in changes {
            let Some(unit) = curriculum.find_unit_by_path(&change.path) else {
                // changes with no corresponding unit are ignored at this layer
                debug!(path = %change.path, "change has no matching unit; skipping");
                skipped_paths.push(change.path.clone());
                continue;
            };
            match change.kind {
                FileChangeKind::Deleted => to_archive.push((unit.id, change.path.clone())),
                FileChangeKind::Added | FileChangeKind::Modified => tasks.push(RegenTask {
                    unit_id: unit.id,
                    path: change.path.clone(),
                    unit: unit.clone(),
                }),
            }
        }

        // fan out regeneration with bounded parallelism, then merge the
        // buffered results serially once every call has settled
        let results = self.regenerate_all(tasks, provider, regenerator).await;

        let mut unit_changes: Vec<UnitChangeRecord> = Vec::new();
        let mut failed_paths: Vec<String> = Vec::new();
        for result in results {
            match result.outcome {
                Ok((fields, analysis)) => {
                    let notes =
                        self.merge_unit(curriculum, result.unit_id, fields, &analysis, registry);
                    unit_changes.push(UnitChangeRecord {
                        unit_id: result.unit_id,
                        path: result.path,
                        kind: UnitChangeKind::Content,
                        failed: false,
                        notes,
                    });
                }
                Err(reason) => {
                    warn!(path = %result.path, %reason, "unit regeneration failed; continuing batch");
                    // the failure still belongs in the version history
                    unit_changes.push(UnitChangeRecord {
                        unit_id: result.unit_id,
                        path: result.path.clone(),
                        kind: UnitChangeKind::Content,
                        failed: true,
                        notes: vec![reason],
                    });
                    failed_paths.push(result.path);
                }
            }
        }

        for (unit_id, path) in to_archive {
            if self.archive_unit(curriculum, unit_id) {
                unit_changes.push(UnitChangeRecord {
                    unit_id,
                    path,
                    kind: UnitChangeKind::Archived,
                    failed: false,
                    notes: vec!["source artifact deleted".to_string()],
                });
            }
        }

        // post-batch cleanup: drop emptied modules, renumber, re-aggregate
        curriculum.modules.retain(|m| !m.units.is_empty());
        curriculum.recompute_aggregates();

        let entry = ledger
            .record(
                unit_changes,
                changes.to_vec(),
                curriculum.unit_count(),
                self.config.version_bump_threshold,
            )
            .clone();

        info!(
            version = %entry.version,
            updated = entry.updated_units,
            archived = entry.archived_units,
            failed = failed_paths.len(),
            "reconciliation batch complete"
        );
        Ok(ReconcileOutcome {
            entry,
            failed_paths,
            skipped_paths,
        })
    }

    async fn regenerate_all(
        &self,
        tasks: Vec<RegenTask>,
        provider: &dyn AnalysisProvider,
        regenerator: &dyn ContentRegenerator,
    ) -> Vec<RegenResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_regenerations));
        let futures = tasks.into_iter().map(|task| {
            let semaphore = semaphore.clone();
            async move {
                let permit = semaphore.acquire().await;
                let outcome = match permit {
                    Ok(_permit) => match provider.analyze(&task.path).await {
                        Ok(analysis) => {
                            match regenerator.regenerate(&task.unit, &analysis).await {
                                Ok(fields) => Ok((fields, analysis)),
                                Err(e) => Err(format!("regeneration failed: {}", e)),
                            }
                        }
                        Err(e) => Err(format!("analysis failed: {}", e)),
                    },
                    Err(e) => Err(format!("scheduling failed: {}", e)),
                };
                RegenResult {
                    unit_id: task.unit_id,
                    path: task.path,
                    outcome,
                }
            }
        });
        futures::future::join_all(futures).await
    }

    /// Field-level merge: prose fields marked in the manual-edit registry
    /// keep their previous values; metadata is always refreshed from the
    /// new analysis because it is derived, not authored.
    fn merge_unit(
        &self,
        curriculum: &mut Curriculum,
        unit_id: UnitId,
        fields: ContentFields,
        analysis: &FileAnalysis,
        registry: &ManualEditRegistry,
    ) -> Vec<String> {
        let Some(unit) = curriculum
            .modules
            .iter_mut()
            .flat_map(|m| m.units.iter_mut())
            .find(|u| u.id == unit_id)
        else {
            return vec!["unit vanished before merge".to_string()];
        };

        let mut notes = Vec::new();
        let mut preserved: Vec<&str> = Vec::new();
        {
            let mut apply = |name: &'static str, slot: &mut String, value: String| {
                if registry.is_marked(unit_id, name) {
                    preserved.push(name);
                } else {
                    *slot = value;
                }
            };
            apply("title", &mut unit.title, fields.title);
            apply("summary", &mut unit.summary, fields.summary);
            apply("introduction", &mut unit.introduction, fields.introduction);
            apply("walkthrough", &mut unit.walkthrough, fields.walkthrough);
        }
        if !preserved.is_empty() {
            notes.push(format!("preserved manual edits: {}", preserved.join(", ")));
        }
        let regenerated: Vec<&str> = PROSE_FIELDS
            .iter()
            .copied()
            .filter(|f| !preserved.contains(f))
            .collect();
        if !regenerated.is_empty() {
            notes.push(format!("regenerated: {}", regenerated.join(", ")));
        }

        let new_difficulty = difficulty_from_complexity(analysis.complexity);
        if new_difficulty != unit.difficulty {
            notes.push(format!(
                "difficulty: {} -> {}",
                unit.difficulty, new_difficulty
            ));
        }
        unit.difficulty = new_difficulty;
        unit.teaching_value = analysis.teaching_value.clamp(0.0, 1.0);
        unit.duration_minutes = estimate_duration(
            analysis.complexity,
            analysis.documentation_coverage,
            &self.config,
        );
        let mut concepts: Vec<String> = analysis
            .patterns
            .iter()
            .map(|p| p.category.to_string())
            .collect();
        let mut seen = HashSet::new();
        concepts.retain(|c| seen.insert(c.clone()));
        unit.tags = concepts.clone();
        unit.concepts = concepts;
        unit.updated_at = Utc::now();
        notes.push("metadata refreshed from analysis".to_string());
        notes
    }

    /// Move a unit from its module into the archive. Returns false when the
    /// unit is not in any module (already archived, for instance).
    fn archive_unit(&self, curriculum: &mut Curriculum, unit_id: UnitId) -> bool {
        for module in &mut curriculum.modules {
            if let Some(idx) = module.units.iter().position(|u| u.id == unit_id) {
                let unit = module.units.remove(idx);
                curriculum.archive.units.push(ArchivedUnit {
                    unit,
                    archived_at: Utc::now(),
                    reason: "source artifact deleted".to_string(),
                });
                return true;
            }
        }
        false
    }
}
