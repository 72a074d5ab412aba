//! End-to-end lifecycle: build a curriculum from analyzed artifacts, then
//! keep it consistent across modify/delete cycles through the sync engine.

use async_trait::async_trait;
use curricula_core::{
    AnalysisProvider, ContentFields, ContentRegenerator, ContentUnit, CurriculumConfig,
    FileAnalysis, ImportEntry, ManualEditRegistry, MatchedPattern, PatternCategory, Result,
    SemanticVersion,
};
use curricula_sequencer::CurriculumBuilder;
use curricula_sync::{MemoryStore, SyncEngine, VersionLedger};
use std::collections::HashMap;
use std::path::Path;

/// Derives deterministic analysis from the artifact file name so tests can
/// steer difficulty and imports through naming alone.
struct NamingProvider {
    imports: HashMap<String, Vec<String>>,
}

impl NamingProvider {
    fn new() -> Self {
        Self {
            imports: HashMap::new(),
        }
    }

    fn with_import(mut self, path_contains: &str, import: &str) -> Self {
        self.imports
            .entry(path_contains.to_string())
            .or_default()
            .push(import.to_string());
        self
    }
}

#[async_trait]
impl AnalysisProvider for NamingProvider {
    async fn analyze(&self, path: &str) -> Result<FileAnalysis> {
        let complexity = if path.contains("advanced") {
            0.8
        } else if path.contains("mid") {
            0.5
        } else {
            0.2
        };
        let imports = self
            .imports
            .iter()
            .filter(|(needle, _)| path.contains(needle.as_str()))
            .flat_map(|(_, targets)| targets.iter().map(|t| ImportEntry::new(t.clone())))
            .collect();
        Ok(FileAnalysis {
            imports,
            patterns: vec![MatchedPattern::new(PatternCategory::Algorithm, 0.9)],
            complexity,
            teaching_value: 0.6,
            documentation_coverage: 0.5,
        })
    }
}

struct EchoRegenerator;

#[async_trait]
impl ContentRegenerator for EchoRegenerator {
    async fn regenerate(
        &self,
        unit: &ContentUnit,
        analysis: &FileAnalysis,
    ) -> Result<ContentFields> {
        Ok(ContentFields {
            title: unit.title.clone(),
            summary: format!("summary ({:.1})", analysis.complexity),
            introduction: "intro".into(),
            walkthrough: "walkthrough".into(),
        })
    }
}

fn write_artifacts(dir: &Path, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            std::fs::write(&path, format!("# {}\nprint('v1')\n", name)).unwrap();
            path.to_string_lossy().to_string()
        })
        .collect()
}

fn config() -> CurriculumConfig {
    CurriculumConfig {
        min_modules: 1,
        max_modules: 3,
        ideal_units_per_module: 2,
        ..Default::default()
    }
}

#[tokio::test]
async fn full_lifecycle_build_modify_delete() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NamingProvider::new().with_import("advanced_search", "basics_intro");
    let paths = write_artifacts(
        dir.path(),
        &["basics_intro.py", "mid_sorting.py", "advanced_search.py"],
    );

    let builder = CurriculumBuilder::new(config()).unwrap();
    let mut curriculum = builder.build("Course", &provider, &paths).await.unwrap();
    assert_eq!(curriculum.unit_count(), 3);

    // the import edge puts basics before advanced wherever they share a module
    for module in &curriculum.modules {
        let basics = module.units.iter().position(|u| u.source_path.contains("basics"));
        let advanced = module
            .units
            .iter()
            .position(|u| u.source_path.contains("advanced"));
        if let (Some(b), Some(a)) = (basics, advanced) {
            assert!(b < a);
        }
    }

    let store = MemoryStore::new();
    let registry = ManualEditRegistry::new();
    let engine = SyncEngine::new(config(), &provider, &EchoRegenerator, &store).unwrap();

    // first pass: no prior fingerprints, every artifact reads as added
    let first = engine
        .synchronize(&mut curriculum, &registry, &paths)
        .await
        .unwrap();
    assert_eq!(first.entry.updated_units, 3);
    assert_eq!(first.entry.version, SemanticVersion::new(1, 0, 1));

    // second pass with nothing changed: idempotent, zero-update entry
    let second = engine
        .synchronize(&mut curriculum, &registry, &paths)
        .await
        .unwrap();
    assert_eq!(second.entry.updated_units, 0);
    assert_eq!(second.entry.archived_units, 0);
    assert_eq!(second.entry.version, SemanticVersion::new(1, 0, 2));

    // third pass: one modified artifact, one deleted artifact
    let modified = paths.iter().find(|p| p.contains("mid_sorting")).unwrap();
    std::fs::write(modified, "# mid_sorting\nprint('v2')\n").unwrap();
    let deleted = paths.iter().find(|p| p.contains("advanced_search")).unwrap();
    let deleted_duration = curriculum
        .find_unit_by_path(deleted)
        .unwrap()
        .duration_minutes;
    let total_before = curriculum.total_duration_minutes;
    std::fs::remove_file(deleted).unwrap();

    let third = engine
        .synchronize(&mut curriculum, &registry, &paths)
        .await
        .unwrap();
    assert_eq!(third.entry.updated_units, 1);
    assert_eq!(third.entry.archived_units, 1);
    assert!(curriculum.find_unit_by_path(deleted).is_none());
    assert_eq!(curriculum.archive.units.len(), 1);
    assert_eq!(
        curriculum.total_duration_minutes,
        total_before - deleted_duration
    );

    // ledger survives a reload through the store, newest entry first
    let ledger = VersionLedger::load(&store, curriculum.id).await;
    assert_eq!(ledger.len(), 3);
    let newest = ledger.entries().next().unwrap();
    assert_eq!(newest.version, SemanticVersion::new(1, 0, 3));
    assert_eq!(newest.archived_units, 1);
}

#[tokio::test]
async fn manual_edits_survive_regeneration_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NamingProvider::new();
    let paths = write_artifacts(dir.path(), &["basics_a.py", "basics_b.py"]);

    let builder = CurriculumBuilder::new(config()).unwrap();
    let mut curriculum = builder.build("Course", &provider, &paths).await.unwrap();

    let store = MemoryStore::new();
    let engine = SyncEngine::new(config(), &provider, &EchoRegenerator, &store).unwrap();

    // seed content, then mark one summary as manually edited
    let registry = ManualEditRegistry::new();
    engine
        .synchronize(&mut curriculum, &registry, &paths)
        .await
        .unwrap();

    let edited_id = curriculum.find_unit_by_path(&paths[0]).unwrap().id;
    {
        let unit = curriculum
            .modules
            .iter_mut()
            .flat_map(|m| m.units.iter_mut())
            .find(|u| u.id == edited_id)
            .unwrap();
        unit.summary = "hand-written summary".to_string();
    }
    let mut registry = ManualEditRegistry::new();
    registry.mark(edited_id, "summary");

    std::fs::write(&paths[0], "# basics_a\nprint('v2')\n").unwrap();
    std::fs::write(&paths[1], "# basics_b\nprint('v2')\n").unwrap();
    let outcome = engine
        .synchronize(&mut curriculum, &registry, &paths)
        .await
        .unwrap();
    assert_eq!(outcome.entry.updated_units, 2);

    let edited = curriculum.find_unit_by_path(&paths[0]).unwrap();
    assert_eq!(edited.summary, "hand-written summary");
    let untouched = curriculum.find_unit_by_path(&paths[1]).unwrap();
    assert_eq!(untouched.summary, "summary (0.2)");
}
