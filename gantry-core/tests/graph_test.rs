use gantry_core::error::Error;
use gantry_core::graph::TaskGraph;
use gantry_core::registry::TaskRegistry;
use gantry_core::task::Task;

fn registry_of(tasks: Vec<Task>) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    for task in tasks {
        registry.register(task).unwrap();
    }
    registry
}

fn chain() -> TaskRegistry {
    registry_of(vec![
        Task::new("compile", "echo compile", vec![]),
        Task::new("bundle", "echo bundle", vec!["compile".to_string()]),
        Task::new("minify", "echo minify", vec!["bundle".to_string()]),
    ])
}

#[test]
fn test_topological_order() {
    let graph = TaskGraph::new(&chain()).unwrap();
    let order = graph.topological_order();

    assert_eq!(order, ["compile", "bundle", "minify"]);
}

#[test]
fn test_ties_break_by_declaration_order() {
    let registry = registry_of(vec![
        Task::new("zeta", "echo z", vec![]),
        Task::new("mid", "echo m", vec![]),
        Task::new("alpha", "echo a", vec![]),
    ]);
    let graph = TaskGraph::new(&registry).unwrap();

    assert_eq!(graph.topological_order(), ["zeta", "mid", "alpha"]);
}

#[test]
fn test_dependency_levels() {
    let registry = registry_of(vec![
        Task::new("compile", "echo compile", vec![]),
        Task::new("lint", "echo lint", vec![]),
        Task::new("bundle", "echo bundle", vec!["compile".to_string()]),
        Task::new(
            "package",
            "echo package",
            vec!["bundle".to_string(), "lint".to_string()],
        ),
    ]);
    let graph = TaskGraph::new(&registry).unwrap();
    let levels = graph.dependency_levels();

    assert_eq!(levels.len(), 3);
    assert_eq!(levels[0], vec!["compile", "lint"]);
    assert_eq!(levels[1], vec!["bundle"]);
    assert_eq!(levels[2], vec!["package"]);
}

#[test]
fn test_dependencies() {
    let graph = TaskGraph::new(&chain()).unwrap();

    let deps = graph.dependencies("bundle").unwrap();
    assert_eq!(deps, vec!["compile"]);

    let deps = graph.dependencies("compile").unwrap();
    assert!(deps.is_empty());
}

#[test]
fn test_dependents() {
    let graph = TaskGraph::new(&chain()).unwrap();

    let dependents = graph.dependents("compile").unwrap();
    assert_eq!(dependents, vec!["bundle"]);

    let dependents = graph.dependents("minify").unwrap();
    assert!(dependents.is_empty());
}

#[test]
fn test_closure() {
    let mut registry = chain();
    registry
        .register(Task::new("unrelated", "echo other", vec![]))
        .unwrap();
    let graph = TaskGraph::new(&registry).unwrap();

    let closure = graph.closure(&["bundle".to_string()]).unwrap();
    assert_eq!(closure.len(), 2);
    assert!(closure.contains("compile"));
    assert!(closure.contains("bundle"));
    assert!(!closure.contains("unrelated"));

    let closure = graph.closure(&["minify".to_string()]).unwrap();
    assert_eq!(closure.len(), 3);
}

#[test]
fn test_closure_unknown_task() {
    let graph = TaskGraph::new(&chain()).unwrap();

    let result = graph.closure(&["deploy".to_string()]);
    assert!(matches!(result, Err(Error::TaskNotFound { .. })));
}

#[test]
fn test_circular_dependency() {
    let registry = registry_of(vec![
        Task::new("a", "echo a", vec!["b".to_string()]),
        Task::new("b", "echo b", vec!["a".to_string()]),
    ]);

    let result = TaskGraph::new(&registry);
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Circular dependency"));
}

#[test]
fn test_unknown_dependency() {
    let registry = registry_of(vec![Task::new(
        "bundle",
        "echo bundle",
        vec!["compile".to_string()],
    )]);

    let result = TaskGraph::new(&registry);
    match result {
        Err(Error::UnknownDependency { task, dependency }) => {
            assert_eq!(task, "bundle");
            assert_eq!(dependency, "compile");
        }
        other => panic!("expected UnknownDependency, got {:?}", other),
    }
}

#[test]
fn test_empty_graph() {
    let graph = TaskGraph::new(&TaskRegistry::new()).unwrap();

    assert!(graph.is_empty());
    assert!(graph.topological_order().is_empty());
    assert!(graph.dependency_levels().is_empty());
}
