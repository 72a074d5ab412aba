use curricula_core::{ContentUnit, PatternCategory};
use std::collections::HashMap;

/// A candidate unit annotated with its dominant matched pattern, if any.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub unit: ContentUnit,
    pub pattern: Option<PatternCategory>,
}

/// Units sharing one dominant pattern. Pattern-less units travel as
/// singleton groups with `category: None`.
#[derive(Debug, Clone)]
pub struct UnitGroup {
    pub category: Option<PatternCategory>,
    pub units: Vec<ContentUnit>,
}

impl UnitGroup {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Cluster candidates by dominant pattern. Pattern groups come first,
/// ordered by member count descending (count ties break on category
/// priority weight, then first occurrence); singleton groups for
/// pattern-less units follow in input order.
pub fn group_by_pattern(candidates: Vec<Candidate>) -> Vec<UnitGroup> {
    let mut order: Vec<PatternCategory> = Vec::new();
    let mut buckets: HashMap<PatternCategory, Vec<ContentUnit>> = HashMap::new();
    let mut loose: Vec<ContentUnit> = Vec::new();

    for c in candidates {
        match c.pattern {
            Some(category) => {
                if !buckets.contains_key(&category) {
                    order.push(category);
                }
                buckets.entry(category).or_default().push(c.unit);
            }
            None => loose.push(c.unit),
        }
    }

    let mut groups: Vec<UnitGroup> = order
        .iter()
        .map(|category| UnitGroup {
            category: Some(*category),
            units: buckets.remove(category).unwrap_or_default(),
        })
        .collect();

    // stable sort keeps first-occurrence order on full ties
    groups.sort_by(|a, b| {
        b.len().cmp(&a.len()).then_with(|| {
            let wa = a.category.map(|c| c.priority_weight()).unwrap_or(0.0);
            let wb = b.category.map(|c| c.priority_weight()).unwrap_or(0.0);
            wb.partial_cmp(&wa).unwrap_or(std::cmp::Ordering::Equal)
        })
    });

    for unit in loose {
        groups.push(UnitGroup {
            category: None,
            units: vec![unit],
        });
    }
    groups
}
