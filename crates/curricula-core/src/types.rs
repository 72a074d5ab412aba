use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type UnitId = Uuid;
pub type ModuleId = Uuid;
pub type CurriculumId = Uuid;

/// Ordered difficulty classification for units and modules.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

/// Closed set of pattern categories recognized by the analysis provider.
/// Unknown category strings map to `General`; priority weighting goes
/// through an explicit table rather than substring matching on names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    DataStructure,
    Algorithm,
    ErrorHandling,
    Concurrency,
    Io,
    Api,
    Testing,
    Configuration,
    General,
}

impl PatternCategory {
    /// Weight used to break ordering ties between pattern groups.
    pub fn priority_weight(&self) -> f64 {
        match self {
            PatternCategory::Algorithm => 1.0,
            PatternCategory::DataStructure => 0.9,
            PatternCategory::Concurrency => 0.8,
            PatternCategory::ErrorHandling => 0.7,
            PatternCategory::Api => 0.6,
            PatternCategory::Io => 0.5,
            PatternCategory::Testing => 0.4,
            PatternCategory::Configuration => 0.3,
            PatternCategory::General => 0.1,
        }
    }
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PatternCategory::DataStructure => "data_structure",
            PatternCategory::Algorithm => "algorithm",
            PatternCategory::ErrorHandling => "error_handling",
            PatternCategory::Concurrency => "concurrency",
            PatternCategory::Io => "io",
            PatternCategory::Api => "api",
            PatternCategory::Testing => "testing",
            PatternCategory::Configuration => "configuration",
            PatternCategory::General => "general",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PatternCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "data_structure" => Ok(PatternCategory::DataStructure),
            "algorithm" => Ok(PatternCategory::Algorithm),
            "error_handling" => Ok(PatternCategory::ErrorHandling),
            "concurrency" => Ok(PatternCategory::Concurrency),
            "io" => Ok(PatternCategory::Io),
            "api" => Ok(PatternCategory::Api),
            "testing" => Ok(PatternCategory::Testing),
            "configuration" => Ok(PatternCategory::Configuration),
            _ => Ok(PatternCategory::General),
        }
    }
}

/// Prose fields produced by the external content regenerator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentFields {
    pub title: String,
    pub summary: String,
    pub introduction: String,
    pub walkthrough: String,
}

/// An atomic lesson-like item tied to one source artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    pub id: UnitId,
    pub title: String,
    pub summary: String,
    pub introduction: String,
    pub walkthrough: String,
    pub difficulty: Difficulty,
    pub duration_minutes: u32,
    pub source_path: String,
    pub teaching_value: f64,
    pub concepts: Vec<String>,
    pub tags: Vec<String>,
    pub prerequisites: Vec<UnitId>,
    pub position: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentUnit {
    pub fn new(title: impl Into<String>, source_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            summary: String::new(),
            introduction: String::new(),
            walkthrough: String::new(),
            difficulty: Difficulty::Beginner,
            duration_minutes: 0,
            source_path: source_path.into(),
            teaching_value: 0.0,
            concepts: Vec::new(),
            tags: Vec::new(),
            prerequisites: Vec::new(),
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A unit that has been removed from its module; units are never
/// hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedUnit {
    pub unit: ContentUnit,
    pub archived_at: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    pub units: Vec<ArchivedUnit>,
}

impl Archive {
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.iter().any(|a| a.unit.id == id)
    }
}

/// An ordered group of content units, the curriculum's top-level grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub title: String,
    pub units: Vec<ContentUnit>,
    pub difficulty: Difficulty,
    pub total_duration_minutes: u32,
    pub position: usize,
}

impl Module {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            units: Vec::new(),
            difficulty: Difficulty::Beginner,
            total_duration_minutes: 0,
            position: 0,
        }
    }

    /// Mode of member difficulties; ties resolve toward the easier tier.
    pub fn aggregate_difficulty(&self) -> Difficulty {
        let mut counts: BTreeMap<Difficulty, usize> = BTreeMap::new();
        for u in &self.units {
            *counts.entry(u.difficulty).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .max_by(|(da, ca), (db, cb)| ca.cmp(cb).then(db.cmp(da)))
            .map(|(d, _)| d)
            .unwrap_or_default()
    }

    /// Refresh aggregate fields and renumber unit positions 0..n-1.
    pub fn recompute(&mut self) {
        for (i, u) in self.units.iter_mut().enumerate() {
            u.position = i;
        }
        self.total_duration_minutes = self.units.iter().map(|u| u.duration_minutes).sum();
        self.difficulty = self.aggregate_difficulty();
    }
}

/// The full ordered collection of modules plus the archive of retired units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    pub id: CurriculumId,
    pub title: String,
    pub modules: Vec<Module>,
    pub archive: Archive,
    pub total_duration_minutes: u32,
    pub difficulty_histogram: BTreeMap<Difficulty, usize>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Curriculum {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            modules: Vec::new(),
            archive: Archive::default(),
            total_duration_minutes: 0,
            difficulty_histogram: BTreeMap::new(),
            tags: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn unit_count(&self) -> usize {
        self.modules.iter().map(|m| m.units.len()).sum()
    }

    pub fn find_unit_by_path(&self, path: &str) -> Option<&ContentUnit> {
        self.modules
            .iter()
            .flat_map(|m| m.units.iter())
            .find(|u| u.source_path == path)
    }

    /// Locate the module index and unit index for a source path.
    pub fn locate_unit_by_path(&self, path: &str) -> Option<(usize, usize)> {
        for (mi, m) in self.modules.iter().enumerate() {
            if let Some(ui) = m.units.iter().position(|u| u.source_path == path) {
                return Some((mi, ui));
            }
        }
        None
    }

    pub fn unit_ids(&self) -> HashSet<UnitId> {
        self.modules
            .iter()
            .flat_map(|m| m.units.iter().map(|u| u.id))
            .chain(self.archive.units.iter().map(|a| a.unit.id))
            .collect()
    }

    /// Recompute every aggregate: per-module rollups, module positions,
    /// total duration, difficulty histogram, and the tag union.
    pub fn recompute_aggregates(&mut self) {
        for m in &mut self.modules {
            m.recompute();
        }
        for (i, m) in self.modules.iter_mut().enumerate() {
            m.position = i;
        }
        self.total_duration_minutes = self.modules.iter().map(|m| m.total_duration_minutes).sum();
        self.difficulty_histogram.clear();
        for u in self.modules.iter().flat_map(|m| m.units.iter()) {
            *self.difficulty_histogram.entry(u.difficulty).or_insert(0) += 1;
        }
        self.tags = self
            .modules
            .iter()
            .flat_map(|m| m.units.iter())
            .flat_map(|u| u.tags.iter().cloned())
            .collect();
        self.updated_at = Utc::now();
    }

    pub fn stats(&self) -> CurriculumStats {
        CurriculumStats {
            module_count: self.modules.len(),
            unit_count: self.unit_count(),
            archived_count: self.archive.units.len(),
            total_duration_minutes: self.total_duration_minutes,
            difficulty_histogram: self.difficulty_histogram.clone(),
        }
    }
}

/// Point-in-time snapshot of curriculum shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumStats {
    pub module_count: usize,
    pub unit_count: usize,
    pub archived_count: usize,
    pub total_duration_minutes: u32,
    pub difficulty_histogram: BTreeMap<Difficulty, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChangeKind {
    Added,
    Modified,
    Deleted,
}

/// One detected artifact change, with fingerprints on both sides where
/// they exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChangeRecord {
    pub path: String,
    pub kind: FileChangeKind,
    pub old_fingerprint: Option<String>,
    pub new_fingerprint: Option<String>,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitChangeKind {
    Content,
    Archived,
}

/// What happened to one unit during a reconciliation batch. A record with
/// `failed` set marks a regeneration that was attempted and lost; the unit
/// keeps its previous content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitChangeRecord {
    pub unit_id: UnitId,
    pub path: String,
    pub kind: UnitChangeKind,
    #[serde(default)]
    pub failed: bool,
    pub notes: Vec<String>,
}

/// major.minor.patch version, monotonic per ledger history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn bump_minor(self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }

    pub fn bump_patch(self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }
}

impl Default for SemanticVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(format!("invalid version string: {}", s));
        }
        let parse = |p: &str| {
            p.parse::<u64>()
                .map_err(|_| format!("invalid version component: {}", p))
        };
        Ok(Self::new(parse(parts[0])?, parse(parts[1])?, parse(parts[2])?))
    }
}

/// One reconciliation outcome. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: SemanticVersion,
    pub created_at: DateTime<Utc>,
    pub summary: String,
    pub unit_changes: Vec<UnitChangeRecord>,
    pub file_changes: Vec<FileChangeRecord>,
    pub total_units: usize,
    pub updated_units: usize,
    pub archived_units: usize,
}

/// Field names a human has explicitly overridden, per unit. Consulted only
/// during reconciliation, never during first-time generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualEditRegistry {
    edits: HashMap<UnitId, BTreeSet<String>>,
}

impl ManualEditRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, unit: UnitId, field: impl Into<String>) {
        self.edits.entry(unit).or_default().insert(field.into());
    }

    pub fn unmark(&mut self, unit: UnitId, field: &str) {
        if let Some(fields) = self.edits.get_mut(&unit) {
            fields.remove(field);
            if fields.is_empty() {
                self.edits.remove(&unit);
            }
        }
    }

    pub fn is_marked(&self, unit: UnitId, field: &str) -> bool {
        self.edits
            .get(&unit)
            .map(|fields| fields.contains(field))
            .unwrap_or(false)
    }

    pub fn fields_for(&self, unit: UnitId) -> Option<&BTreeSet<String>> {
        self.edits.get(&unit)
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}
