use curricula_core::{Curriculum, Difficulty, FileAnalysis, UnitId};
use std::collections::HashMap;
use tracing::debug;

/// Split a source path into separator-aware segments with the file
/// extension stripped from the final segment.
fn path_segments(path: &str) -> Vec<String> {
    let normalized = path.replace('\\', "/");
    let mut segments: Vec<String> = normalized
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    if let Some(last) = segments.last_mut() {
        if let Some(dot) = last.rfind('.') {
            if dot > 0 {
                last.truncate(dot);
            }
        }
    }
    segments
}

fn ends_with_segments(path: &[String], suffix: &[String]) -> bool {
    suffix.len() <= path.len() && path[path.len() - suffix.len()..] == *suffix
}

/// Resolve an import string such as `pkg.sub` against known artifact paths,
/// suffix-wise: a path ending in `pkg/sub` matches, and failing that, one
/// ending in `sub` alone. Returns the matched path.
fn resolve_import<'a>(
    import: &str,
    known: &'a [(String, Vec<String>)],
) -> Option<&'a str> {
    let import_segments: Vec<String> = import
        .replace('\\', "/")
        .split(['.', '/'])
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    if import_segments.is_empty() {
        return None;
    }

    for (path, segments) in known {
        if ends_with_segments(segments, &import_segments) {
            return Some(path);
        }
    }
    if import_segments.len() > 1 {
        let tail = &import_segments[import_segments.len() - 1..];
        for (path, segments) in known {
            if ends_with_segments(segments, tail) {
                return Some(path);
            }
        }
    }
    None
}

#[derive(Debug, Clone, Copy)]
struct UnitMeta {
    id: UnitId,
    difficulty: Difficulty,
    teaching_value: f64,
}

/// Is `candidate` simpler than `unit`: strictly lower difficulty, or the
/// same tier with strictly higher teaching value.
fn is_simpler(candidate: &UnitMeta, unit: &UnitMeta) -> bool {
    candidate.difficulty < unit.difficulty
        || (candidate.difficulty == unit.difficulty
            && candidate.teaching_value > unit.teaching_value)
}

/// Populate `prerequisites` for every unit in the curriculum from import
/// evidence. Unresolvable imports are skipped (debug log); this never
/// fails. Self-references and duplicate ids are discarded.
pub fn resolve_prerequisites(
    curriculum: &mut Curriculum,
    analyses: &HashMap<String, FileAnalysis>,
) {
    let known: Vec<(String, Vec<String>)> = curriculum
        .modules
        .iter()
        .flat_map(|m| m.units.iter())
        .map(|u| (u.source_path.clone(), path_segments(&u.source_path)))
        .collect();
    let meta_by_path: HashMap<String, UnitMeta> = curriculum
        .modules
        .iter()
        .flat_map(|m| m.units.iter())
        .map(|u| {
            (
                u.source_path.clone(),
                UnitMeta {
                    id: u.id,
                    difficulty: u.difficulty,
                    teaching_value: u.teaching_value,
                },
            )
        })
        .collect();

    for module in &mut curriculum.modules {
        for unit in &mut module.units {
            let Some(analysis) = analyses.get(&unit.source_path) else {
                continue;
            };
            let me = UnitMeta {
                id: unit.id,
                difficulty: unit.difficulty,
                teaching_value: unit.teaching_value,
            };
            let mut prereqs: Vec<UnitId> = Vec::new();
            for import in &analysis.imports {
                let Some(path) = resolve_import(&import.target, &known) else {
                    debug!(
                        import = %import.target,
                        unit = %unit.source_path,
                        "import did not resolve to a known unit; skipping"
                    );
                    continue;
                };
                let Some(candidate) = meta_by_path.get(path) else {
                    continue;
                };
                if candidate.id == me.id {
                    continue;
                }
                if is_simpler(candidate, &me) && !prereqs.contains(&candidate.id) {
                    prereqs.push(candidate.id);
                }
            }
            unit.prerequisites = prereqs;
        }
    }
}
