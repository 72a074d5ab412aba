use crate::grouper::{group_by_pattern, Candidate};
use crate::partitioner::partition_groups;
use crate::prerequisites::resolve_prerequisites;
use crate::sequencer::sequence_curriculum;
use curricula_core::{
    AnalysisProvider, ContentUnit, Curriculum, CurriculumConfig, Difficulty, FileAnalysis, Module,
    PatternCategory, Result,
};
use std::collections::HashMap;
use tracing::info;

/// Human-facing module title for a dominant pattern category.
fn category_title(category: Option<PatternCategory>) -> String {
    match category {
        Some(PatternCategory::DataStructure) => "Data Structures".to_string(),
        Some(PatternCategory::Algorithm) => "Algorithms".to_string(),
        Some(PatternCategory::ErrorHandling) => "Error Handling".to_string(),
        Some(PatternCategory::Concurrency) => "Concurrency".to_string(),
        Some(PatternCategory::Io) => "Input and Output".to_string(),
        Some(PatternCategory::Api) => "APIs and Interfaces".to_string(),
        Some(PatternCategory::Testing) => "Testing".to_string(),
        Some(PatternCategory::Configuration) => "Configuration".to_string(),
        Some(PatternCategory::General) | None => "Foundations".to_string(),
    }
}

fn title_from_path(path: &str) -> String {
    let stem = path
        .replace('\\', "/")
        .rsplit('/')
        .next()
        .map(|s| s.split('.').next().unwrap_or(s).to_string())
        .unwrap_or_else(|| path.to_string());
    let words = stem.replace(['_', '-'], " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => words,
    }
}

/// Difficulty tier from an artifact's complexity score.
pub fn difficulty_from_complexity(complexity: f64) -> Difficulty {
    if complexity < 0.35 {
        Difficulty::Beginner
    } else if complexity < 0.7 {
        Difficulty::Intermediate
    } else {
        Difficulty::Advanced
    }
}

/// Duration estimate from complexity and documentation coverage, clamped to
/// the configured per-unit bounds.
pub fn estimate_duration(
    complexity: f64,
    documentation_coverage: f64,
    config: &CurriculumConfig,
) -> u32 {
    let raw = 15.0 + complexity.clamp(0.0, 1.0) * 60.0 + documentation_coverage.clamp(0.0, 1.0) * 15.0;
    (raw.round() as u32).clamp(
        config.min_unit_duration_minutes,
        config.max_unit_duration_minutes,
    )
}

/// Map one analyzed artifact to a teachable unit. Prose fields stay empty;
/// they belong to the external content generator.
pub fn unit_from_analysis(
    path: &str,
    analysis: &FileAnalysis,
    config: &CurriculumConfig,
) -> ContentUnit {
    let mut unit = ContentUnit::new(title_from_path(path), path);
    unit.difficulty = difficulty_from_complexity(analysis.complexity);
    unit.teaching_value = analysis.teaching_value.clamp(0.0, 1.0);
    unit.duration_minutes =
        estimate_duration(analysis.complexity, analysis.documentation_coverage, config);
    unit.concepts = analysis
        .patterns
        .iter()
        .map(|p| p.category.to_string())
        .collect();
    let mut seen = std::collections::HashSet::new();
    unit.concepts.retain(|c| seen.insert(c.clone()));
    unit.tags = unit.concepts.clone();
    unit
}

/// Builds an initial curriculum from analyzed artifacts: group by dominant
/// pattern, partition into modules, resolve prerequisites from import
/// evidence, and sequence. The manual-edit registry is never consulted
/// here; that seam exists only for reconciliation.
pub struct CurriculumBuilder {
    config: CurriculumConfig,
}

impl CurriculumBuilder {
    pub fn new(config: CurriculumConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CurriculumConfig {
        &self.config
    }

    pub async fn build(
        &self,
        title: &str,
        provider: &dyn AnalysisProvider,
        paths: &[String],
    ) -> Result<Curriculum> {
        let results = futures::future::try_join_all(
            paths.iter().map(|path| provider.analyze(path)),
        )
        .await?;
        let analyses: HashMap<String, FileAnalysis> =
            paths.iter().cloned().zip(results).collect();
        self.build_from_analyses(title, paths, &analyses)
    }

    /// Pure-compute entry point once analysis payloads are in hand.
    pub fn build_from_analyses(
        &self,
        title: &str,
        paths: &[String],
        analyses: &HashMap<String, FileAnalysis>,
    ) -> Result<Curriculum> {
        let candidates: Vec<Candidate> = paths
            .iter()
            .filter_map(|path| analyses.get(path).map(|a| (path, a)))
            .map(|(path, analysis)| Candidate {
                unit: unit_from_analysis(path, analysis, &self.config),
                pattern: analysis.dominant_pattern().map(|p| p.category),
            })
            .collect();

        let groups = group_by_pattern(candidates);
        let partitions = partition_groups(groups, &self.config);

        let mut curriculum = Curriculum::new(title);
        for units in partitions {
            let dominant = dominant_category(&units, analyses);
            let mut module = Module::new(category_title(dominant));
            module.units = units;
            curriculum.modules.push(module);
        }

        resolve_prerequisites(&mut curriculum, analyses);
        sequence_curriculum(&mut curriculum);
        curriculum.recompute_aggregates();

        info!(
            modules = curriculum.modules.len(),
            units = curriculum.unit_count(),
            "built initial curriculum"
        );
        Ok(curriculum)
    }
}

/// Most frequent dominant category among a module's units.
fn dominant_category(
    units: &[ContentUnit],
    analyses: &HashMap<String, FileAnalysis>,
) -> Option<PatternCategory> {
    let mut counts: HashMap<PatternCategory, usize> = HashMap::new();
    let mut order: Vec<PatternCategory> = Vec::new();
    for u in units {
        if let Some(category) = analyses
            .get(&u.source_path)
            .and_then(|a| a.dominant_pattern())
            .map(|p| p.category)
        {
            if !counts.contains_key(&category) {
                order.push(category);
            }
            *counts.entry(category).or_insert(0) += 1;
        }
    }
    // first occurrence wins on a count tie
    let mut best: Option<(PatternCategory, usize)> = None;
    for category in order {
        let count = counts.get(&category).copied().unwrap_or(0);
        if best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((category, count));
        }
    }
    best.map(|(category, _)| category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use curricula_core::{ImportEntry, MatchedPattern};

    struct MapProvider {
        analyses: HashMap<String, FileAnalysis>,
    }

    #[async_trait]
    impl AnalysisProvider for MapProvider {
        async fn analyze(&self, path: &str) -> Result<FileAnalysis> {
            Ok(self.analyses.get(path).cloned().unwrap_or_default())
        }
    }

    fn analysis(
        category: PatternCategory,
        complexity: f64,
        teaching_value: f64,
        imports: &[&str],
    ) -> FileAnalysis {
        FileAnalysis {
            imports: imports.iter().map(|i| ImportEntry::new(*i)).collect(),
            patterns: vec![MatchedPattern::new(category, 0.9)],
            complexity,
            teaching_value,
            documentation_coverage: 0.5,
        }
    }

    #[test]
    fn difficulty_thresholds() {
        assert_eq!(difficulty_from_complexity(0.1), Difficulty::Beginner);
        assert_eq!(difficulty_from_complexity(0.5), Difficulty::Intermediate);
        assert_eq!(difficulty_from_complexity(0.9), Difficulty::Advanced);
    }

    #[test]
    fn duration_respects_configured_bounds() {
        let config = CurriculumConfig {
            min_unit_duration_minutes: 20,
            max_unit_duration_minutes: 40,
            ..Default::default()
        };
        assert_eq!(estimate_duration(0.0, 0.0, &config), 20);
        assert_eq!(estimate_duration(1.0, 1.0, &config), 40);
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let config = CurriculumConfig {
            min_modules: 5,
            max_modules: 2,
            ..Default::default()
        };
        assert!(CurriculumBuilder::new(config).is_err());
    }

    #[tokio::test]
    async fn import_edge_orders_beginner_before_intermediate() {
        let mut analyses = HashMap::new();
        analyses.insert(
            "src/basics.py".to_string(),
            analysis(PatternCategory::Algorithm, 0.2, 0.6, &[]),
        );
        analyses.insert(
            "src/applied.py".to_string(),
            analysis(PatternCategory::Algorithm, 0.5, 0.8, &["basics"]),
        );
        let provider = MapProvider {
            analyses: analyses.clone(),
        };
        let builder = CurriculumBuilder::new(CurriculumConfig {
            min_modules: 1,
            max_modules: 2,
            ..Default::default()
        })
        .unwrap();
        let paths = vec!["src/basics.py".to_string(), "src/applied.py".to_string()];
        let cur = builder.build("course", &provider, &paths).await.unwrap();

        let module = &cur.modules[0];
        let basics = module.units.iter().find(|u| u.source_path == "src/basics.py").unwrap();
        let applied = module.units.iter().find(|u| u.source_path == "src/applied.py").unwrap();
        assert_eq!(applied.prerequisites, vec![basics.id]);
        assert!(basics.position < applied.position);
    }

    #[tokio::test]
    async fn twelve_units_land_in_three_modules() {
        let mut analyses = HashMap::new();
        let mut paths = Vec::new();
        let categories = [
            PatternCategory::Algorithm,
            PatternCategory::DataStructure,
            PatternCategory::Io,
        ];
        for i in 0..12 {
            let path = format!("src/unit_{:02}.py", i);
            analyses.insert(
                path.clone(),
                analysis(categories[i % 3], 0.3, 0.5, &[]),
            );
            paths.push(path);
        }
        let provider = MapProvider { analyses };
        let builder = CurriculumBuilder::new(CurriculumConfig {
            min_modules: 3,
            max_modules: 8,
            ideal_units_per_module: 4,
            ..Default::default()
        })
        .unwrap();
        let cur = builder.build("course", &provider, &paths).await.unwrap();
        assert_eq!(cur.modules.len(), 3);
        assert_eq!(cur.unit_count(), 12);
    }

    #[tokio::test]
    async fn modules_are_non_decreasing_in_difficulty() {
        let mut analyses = HashMap::new();
        let mut paths = Vec::new();
        for (i, complexity) in [0.9, 0.1, 0.5, 0.8, 0.2, 0.4].iter().enumerate() {
            let path = format!("src/f{}.py", i);
            analyses.insert(
                path.clone(),
                analysis(
                    if i % 2 == 0 {
                        PatternCategory::Algorithm
                    } else {
                        PatternCategory::Io
                    },
                    *complexity,
                    0.5,
                    &[],
                ),
            );
            paths.push(path);
        }
        let provider = MapProvider { analyses };
        let builder = CurriculumBuilder::new(CurriculumConfig {
            min_modules: 2,
            max_modules: 3,
            ideal_units_per_module: 2,
            ..Default::default()
        })
        .unwrap();
        let cur = builder.build("course", &provider, &paths).await.unwrap();
        let tiers: Vec<_> = cur.modules.iter().map(|m| m.difficulty).collect();
        let mut sorted = tiers.clone();
        sorted.sort();
        assert_eq!(tiers, sorted);
    }
}
