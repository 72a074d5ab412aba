use crate::change_detector::ChangeDetector;
use crate::ledger::VersionLedger;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use curricula_core::{
    AnalysisProvider, ContentRegenerator, Curriculum, CurriculumConfig, KeyValueStore,
    ManualEditRegistry, Result,
};
use tracing::{info, warn};

/// One full maintenance pass: detect artifact changes, reconcile the
/// curriculum, and commit the version entry and fingerprint state. The
/// `&mut Curriculum` receiver keeps reconciliation single-writer per
/// curriculum; the store handles its own consistency across curricula.
pub struct SyncEngine<'a> {
    reconciler: Reconciler,
    provider: &'a dyn AnalysisProvider,
    regenerator: &'a dyn ContentRegenerator,
    store: &'a dyn KeyValueStore,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        config: CurriculumConfig,
        provider: &'a dyn AnalysisProvider,
        regenerator: &'a dyn ContentRegenerator,
        store: &'a dyn KeyValueStore,
    ) -> Result<Self> {
        Ok(Self {
            reconciler: Reconciler::new(config)?,
            provider,
            regenerator,
            store,
        })
    }

    /// Run one reconciliation batch over the supplied artifact paths.
    /// Fingerprint state and the ledger are persisted only after the whole
    /// batch has merged, so an aborted run never commits a version entry.
    pub async fn synchronize(
        &self,
        curriculum: &mut Curriculum,
        registry: &ManualEditRegistry,
        paths: &[String],
    ) -> Result<ReconcileOutcome> {
        let detector = ChangeDetector::new(self.store);
        let mut change_set = detector.detect(curriculum.id, paths).await?;
        info!(
            changes = change_set.records.len(),
            paths = paths.len(),
            "detected artifact changes"
        );

        let mut ledger = VersionLedger::load(self.store, curriculum.id).await;
        let outcome = self
            .reconciler
            .reconcile(
                curriculum,
                &change_set.records,
                registry,
                self.provider,
                self.regenerator,
                &mut ledger,
            )
            .await?;

        // failed paths keep their prior fingerprint so the next run
        // re-detects them instead of reading them as unchanged
        change_set.revert_paths(&outcome.failed_paths);
        if let Err(e) = detector
            .persist_snapshot(curriculum.id, &change_set.snapshot)
            .await
        {
            warn!(error = %e, "failed to persist fingerprint snapshot; next run will recompute");
        }
        if let Err(e) = ledger.save(self.store).await {
            warn!(error = %e, "failed to persist version ledger");
        }
        Ok(outcome)
    }
}
