use curricula_core::{ContentUnit, Curriculum, Module, UnitId};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::warn;

/// Ready-list ordering: difficulty tier ascending, teaching value
/// descending.
fn ready_order(a: &ContentUnit, b: &ContentUnit) -> Ordering {
    a.difficulty.cmp(&b.difficulty).then_with(|| {
        b.teaching_value
            .partial_cmp(&a.teaching_value)
            .unwrap_or(Ordering::Equal)
    })
}

/// Topologically order a module's units with Kahn's algorithm over the
/// prerequisite edges (prerequisite -> dependent), keeping the ready list
/// sorted by `ready_order`. Units caught in a cycle are appended in one
/// pass in the same order; this is deliberate fallback behavior, logged as
/// a warning and never an error.
pub fn sequence_module(module: &mut Module) {
    if module.units.len() < 2 {
        for (i, u) in module.units.iter_mut().enumerate() {
            u.position = i;
        }
        return;
    }

    let index_by_id: HashMap<UnitId, usize> = module
        .units
        .iter()
        .enumerate()
        .map(|(i, u)| (u.id, i))
        .collect();

    // adjacency (prerequisite -> dependents) and in-degrees, edges within
    // this module only
    let n = module.units.len();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree: Vec<usize> = vec![0; n];
    for (i, unit) in module.units.iter().enumerate() {
        for prereq in &unit.prerequisites {
            if let Some(&p) = index_by_id.get(prereq) {
                if p != i {
                    dependents[p].push(i);
                    in_degree[i] += 1;
                }
            }
        }
    }

    let mut ready: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    ready.sort_by(|&a, &b| ready_order(&module.units[a], &module.units[b]));

    let mut output: Vec<usize> = Vec::with_capacity(n);
    while !ready.is_empty() {
        let current = ready.remove(0);
        output.push(current);
        for &dep in &dependents[current] {
            in_degree[dep] -= 1;
            if in_degree[dep] == 0 {
                // ordered insertion after any equal keys, preserving the
                // ready-list sort rather than appending
                let pos = ready.partition_point(|&r| {
                    ready_order(&module.units[r], &module.units[dep]) != Ordering::Greater
                });
                ready.insert(pos, dep);
            }
        }
    }

    if output.len() < n {
        // cyclic remainder: one-pass append in ready order, no retry
        let mut leftover: Vec<usize> = (0..n).filter(|i| !output.contains(i)).collect();
        warn!(
            cycle_units = leftover.len(),
            module = %module.title,
            "dependency cycle detected; appending remaining units in difficulty order"
        );
        leftover.sort_by(|&a, &b| ready_order(&module.units[a], &module.units[b]));
        output.extend(leftover);
    }

    let mut rank = vec![0usize; n];
    for (r, &i) in output.iter().enumerate() {
        rank[i] = r;
    }
    let mut indexed: Vec<(usize, ContentUnit)> = module.units.drain(..).enumerate().collect();
    indexed.sort_by_key(|(i, _)| rank[*i]);
    module.units = indexed.into_iter().map(|(_, u)| u).collect();
    for (i, u) in module.units.iter_mut().enumerate() {
        u.position = i;
    }
}

/// Sequence every module, then sort modules by aggregate difficulty
/// ascending (stable on prior position) and renumber module positions.
pub fn sequence_curriculum(curriculum: &mut Curriculum) {
    for module in &mut curriculum.modules {
        sequence_module(module);
        module.recompute();
    }
    curriculum.modules.sort_by_key(|m| m.difficulty);
    for (i, m) in curriculum.modules.iter_mut().enumerate() {
        m.position = i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curricula_core::Difficulty;

    fn unit(name: &str, difficulty: Difficulty, tv: f64) -> ContentUnit {
        let mut u = ContentUnit::new(name, format!("src/{}.py", name));
        u.difficulty = difficulty;
        u.teaching_value = tv;
        u
    }

    fn position_of(module: &Module, title: &str) -> usize {
        module.units.iter().position(|u| u.title == title).unwrap()
    }

    #[test]
    fn prerequisites_precede_dependents() {
        let basics = unit("basics", Difficulty::Beginner, 0.6);
        let mut app = unit("app", Difficulty::Intermediate, 0.9);
        app.prerequisites = vec![basics.id];
        let mut m = Module::new("m");
        // dependent listed first on purpose
        m.units = vec![app, basics];
        sequence_module(&mut m);

        assert!(position_of(&m, "basics") < position_of(&m, "app"));
        assert_eq!(m.units[0].position, 0);
        assert_eq!(m.units[1].position, 1);
    }

    #[test]
    fn ready_list_orders_by_difficulty_then_teaching_value() {
        let mut m = Module::new("m");
        m.units = vec![
            unit("adv", Difficulty::Advanced, 0.9),
            unit("beg_low", Difficulty::Beginner, 0.2),
            unit("beg_high", Difficulty::Beginner, 0.8),
            unit("mid", Difficulty::Intermediate, 0.5),
        ];
        sequence_module(&mut m);
        let titles: Vec<&str> = m.units.iter().map(|u| u.title.as_str()).collect();
        assert_eq!(titles, vec!["beg_high", "beg_low", "mid", "adv"]);
    }

    #[test]
    fn freed_dependents_are_inserted_in_order_not_appended() {
        // root frees "beg_dep" (beginner) after "adv_free" (advanced) is
        // already waiting; the beginner unit must still come out first
        let root = unit("root", Difficulty::Beginner, 0.9);
        let mut beg_dep = unit("beg_dep", Difficulty::Beginner, 0.5);
        beg_dep.prerequisites = vec![root.id];
        let adv_free = unit("adv_free", Difficulty::Advanced, 0.5);
        let mut m = Module::new("m");
        m.units = vec![adv_free, root, beg_dep];
        sequence_module(&mut m);
        let titles: Vec<&str> = m.units.iter().map(|u| u.title.as_str()).collect();
        assert_eq!(titles, vec!["root", "beg_dep", "adv_free"]);
    }

    #[test]
    fn cycle_falls_back_without_error_and_keeps_all_units() {
        let mut c = unit("c", Difficulty::Beginner, 0.5);
        let mut d = unit("d", Difficulty::Beginner, 0.7);
        let (c_id, d_id) = (c.id, d.id);
        c.prerequisites = vec![d_id];
        d.prerequisites = vec![c_id];
        let standalone = unit("solo", Difficulty::Beginner, 0.9);
        let mut m = Module::new("m");
        m.units = vec![c, d, standalone];
        sequence_module(&mut m);

        assert_eq!(m.units.len(), 3);
        // each cyclic unit appears exactly once
        assert_eq!(m.units.iter().filter(|u| u.id == c_id).count(), 1);
        assert_eq!(m.units.iter().filter(|u| u.id == d_id).count(), 1);
        // acyclic unit first, then the cyclic remainder in ready order
        let titles: Vec<&str> = m.units.iter().map(|u| u.title.as_str()).collect();
        assert_eq!(titles, vec!["solo", "d", "c"]);
    }

    #[test]
    fn cross_module_prerequisites_are_ignored_for_ordering() {
        let external = unit("external", Difficulty::Beginner, 0.9);
        let mut solo = unit("solo", Difficulty::Beginner, 0.5);
        solo.prerequisites = vec![external.id];
        let mut m = Module::new("m");
        m.units = vec![solo];
        sequence_module(&mut m);
        assert_eq!(m.units.len(), 1);
        assert_eq!(m.units[0].position, 0);
    }

    #[test]
    fn modules_sort_by_difficulty_with_stable_ties() {
        let mut cur = Curriculum::new("c");
        let mut hard = Module::new("hard");
        hard.units = vec![unit("h", Difficulty::Advanced, 0.5)];
        let mut easy_a = Module::new("easy_a");
        easy_a.units = vec![unit("a", Difficulty::Beginner, 0.5)];
        let mut easy_b = Module::new("easy_b");
        easy_b.units = vec![unit("b", Difficulty::Beginner, 0.5)];
        cur.modules = vec![hard, easy_a, easy_b];
        sequence_curriculum(&mut cur);

        let titles: Vec<&str> = cur.modules.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["easy_a", "easy_b", "hard"]);
        assert_eq!(cur.modules[0].position, 0);
        assert_eq!(cur.modules[2].position, 2);
    }
}
