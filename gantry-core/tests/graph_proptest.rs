use proptest::prelude::*;

use gantry_core::graph::TaskGraph;
use gantry_core::registry::TaskRegistry;
use gantry_core::task::Task;

const N: usize = 6;

fn task_name(i: usize) -> String {
    format!("task-{}", i)
}

fn gen_dep_matrix() -> impl Strategy<Value = Vec<Vec<bool>>> {
    proptest::collection::vec(proptest::collection::vec(any::<bool>(), N), N)
}

/// Edges only point at earlier declarations, so every generated graph is
/// acyclic by construction.
fn build_graph(matrix: &[Vec<bool>]) -> TaskGraph {
    let mut registry = TaskRegistry::new();
    for i in 0..N {
        let deps: Vec<String> = (0..i).filter(|&j| matrix[i][j]).map(task_name).collect();
        registry
            .register(Task::new(task_name(i), "true", deps))
            .unwrap();
    }
    TaskGraph::new(&registry).unwrap()
}

proptest! {
    #[test]
    fn topological_order_respects_dependencies(matrix in gen_dep_matrix()) {
        let graph = build_graph(&matrix);
        let order = graph.topological_order();
        prop_assert_eq!(order.len(), N);

        let position =
            |name: &str| order.iter().position(|n| n == name).unwrap();
        for i in 0..N {
            for j in 0..i {
                if matrix[i][j] {
                    prop_assert!(position(&task_name(j)) < position(&task_name(i)));
                }
            }
        }
    }

    #[test]
    fn order_has_no_duplicates(matrix in gen_dep_matrix()) {
        let graph = build_graph(&matrix);
        let mut seen = std::collections::HashSet::new();
        for name in graph.topological_order() {
            prop_assert!(seen.insert(name.clone()), "duplicate task in order: {}", name);
        }
    }

    #[test]
    fn levels_place_dependencies_earlier(matrix in gen_dep_matrix()) {
        let graph = build_graph(&matrix);
        let levels = graph.dependency_levels();
        prop_assert_eq!(levels.iter().map(|level| level.len()).sum::<usize>(), N);

        let level_of = |name: &str| {
            levels
                .iter()
                .position(|level| level.iter().any(|n| n == name))
                .unwrap()
        };
        for i in 0..N {
            for j in 0..i {
                if matrix[i][j] {
                    prop_assert!(level_of(&task_name(j)) < level_of(&task_name(i)));
                }
            }
        }
    }

    #[test]
    fn closure_is_dependency_closed(matrix in gen_dep_matrix()) {
        let graph = build_graph(&matrix);
        let closure = graph.closure(&[task_name(N - 1)]).unwrap();
        for name in &closure {
            for dep in graph.dependencies(name).unwrap() {
                prop_assert!(closure.contains(&dep));
            }
        }
    }
}
