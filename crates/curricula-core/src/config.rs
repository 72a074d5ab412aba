use crate::{CurriculaError, Result};
use serde::{Deserialize, Serialize};

/// Tunables for curriculum generation and reconciliation. Validated
/// eagerly: invalid bound relationships fail before any processing starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumConfig {
    #[serde(default = "CurriculumConfig::default_min_modules")]
    pub min_modules: usize,
    #[serde(default = "CurriculumConfig::default_max_modules")]
    pub max_modules: usize,
    #[serde(default = "CurriculumConfig::default_ideal_units_per_module")]
    pub ideal_units_per_module: usize,
    #[serde(default = "CurriculumConfig::default_min_unit_duration")]
    pub min_unit_duration_minutes: u32,
    #[serde(default = "CurriculumConfig::default_max_unit_duration")]
    pub max_unit_duration_minutes: u32,
    /// Change count above which a reconciliation bumps the minor version
    /// instead of the patch version.
    #[serde(default = "CurriculumConfig::default_version_bump_threshold")]
    pub version_bump_threshold: usize,
    #[serde(default = "CurriculumConfig::default_max_concurrent_regenerations")]
    pub max_concurrent_regenerations: usize,
}

impl CurriculumConfig {
    fn default_min_modules() -> usize {
        3
    }

    fn default_max_modules() -> usize {
        8
    }

    fn default_ideal_units_per_module() -> usize {
        4
    }

    fn default_min_unit_duration() -> u32 {
        10
    }

    fn default_max_unit_duration() -> u32 {
        90
    }

    fn default_version_bump_threshold() -> usize {
        5
    }

    fn default_max_concurrent_regenerations() -> usize {
        4
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_modules > self.max_modules {
            return Err(CurriculaError::Config(format!(
                "min_modules ({}) exceeds max_modules ({})",
                self.min_modules, self.max_modules
            )));
        }
        if self.min_unit_duration_minutes > self.max_unit_duration_minutes {
            return Err(CurriculaError::Config(format!(
                "min_unit_duration_minutes ({}) exceeds max_unit_duration_minutes ({})",
                self.min_unit_duration_minutes, self.max_unit_duration_minutes
            )));
        }
        if self.ideal_units_per_module == 0 {
            return Err(CurriculaError::Config(
                "ideal_units_per_module must be at least 1".into(),
            ));
        }
        if self.max_concurrent_regenerations == 0 {
            return Err(CurriculaError::Config(
                "max_concurrent_regenerations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            min_modules: Self::default_min_modules(),
            max_modules: Self::default_max_modules(),
            ideal_units_per_module: Self::default_ideal_units_per_module(),
            min_unit_duration_minutes: Self::default_min_unit_duration(),
            max_unit_duration_minutes: Self::default_max_unit_duration(),
            version_bump_threshold: Self::default_version_bump_threshold(),
            max_concurrent_regenerations: Self::default_max_concurrent_regenerations(),
        }
    }
}
