use crate::PatternCategory;
use serde::{Deserialize, Serialize};

/// One import statement found in an analyzed artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportEntry {
    /// Dotted or slashed module path as written in the source.
    pub target: String,
    pub symbols: Vec<String>,
    pub relative: bool,
}

impl ImportEntry {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            symbols: Vec::new(),
            relative: false,
        }
    }
}

/// One pattern the analysis provider matched in an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPattern {
    pub category: PatternCategory,
    pub confidence: f64,
    pub evidence_lines: Vec<u32>,
}

impl MatchedPattern {
    pub fn new(category: PatternCategory, confidence: f64) -> Self {
        Self {
            category,
            confidence,
            evidence_lines: Vec::new(),
        }
    }
}

/// Read-only analysis payload for a single artifact. The engine never
/// mutates this data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub imports: Vec<ImportEntry>,
    pub patterns: Vec<MatchedPattern>,
    pub complexity: f64,
    pub teaching_value: f64,
    pub documentation_coverage: f64,
}

impl FileAnalysis {
    /// The pattern with the highest confidence; ties go to the first
    /// occurrence in provider order.
    pub fn dominant_pattern(&self) -> Option<&MatchedPattern> {
        let mut best: Option<&MatchedPattern> = None;
        for p in &self.patterns {
            match best {
                Some(b) if p.confidence <= b.confidence => {}
                _ => best = Some(p),
            }
        }
        best
    }
}
