use crate::grouper::UnitGroup;
use curricula_core::{ContentUnit, CurriculumConfig};

/// Module count for a unit total: clamp(ceil(n / ideal), min, max), capped
/// at n so no module starts empty. Zero units yield zero modules.
pub fn target_module_count(unit_count: usize, config: &CurriculumConfig) -> usize {
    if unit_count == 0 {
        return 0;
    }
    let ideal = config.ideal_units_per_module.max(1);
    let raw = unit_count.div_ceil(ideal);
    raw.clamp(config.min_modules, config.max_modules).min(unit_count)
}

/// Distribute ordered groups across the target module count as contiguous
/// slices; the final module absorbs any remainder. When there are fewer
/// groups than modules, the split falls back to contiguous unit slices so
/// every module receives at least one unit.
pub fn partition_groups(
    groups: Vec<UnitGroup>,
    config: &CurriculumConfig,
) -> Vec<Vec<ContentUnit>> {
    let unit_count: usize = groups.iter().map(|g| g.len()).sum();
    let target = target_module_count(unit_count, config);
    if target == 0 {
        return Vec::new();
    }

    if groups.len() >= target {
        let per_module = groups.len() / target;
        let mut modules: Vec<Vec<ContentUnit>> = Vec::with_capacity(target);
        let mut iter = groups.into_iter();
        for i in 0..target {
            let take = if i == target - 1 {
                usize::MAX // final module absorbs the remainder
            } else {
                per_module
            };
            let mut units = Vec::new();
            for g in iter.by_ref().take(take) {
                units.extend(g.units);
            }
            modules.push(units);
        }
        modules
    } else {
        // fewer groups than modules: slice the flattened unit list instead
        let units: Vec<ContentUnit> = groups.into_iter().flat_map(|g| g.units).collect();
        let per_module = units.len() / target;
        let mut modules: Vec<Vec<ContentUnit>> = Vec::with_capacity(target);
        let mut iter = units.into_iter();
        for i in 0..target {
            let take = if i == target - 1 {
                usize::MAX
            } else {
                per_module
            };
            modules.push(iter.by_ref().take(take).collect());
        }
        modules
    }
}
