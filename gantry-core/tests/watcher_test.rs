use std::path::Path;

use tempfile::TempDir;

use gantry_core::config::WatchRule;
use gantry_core::error::Error;
use gantry_core::watcher::{FileWatcher, WatchBinding, WatcherConfig};

#[test]
fn test_binding_matches_patterns() {
    let binding = WatchBinding::new(
        vec!["src/**/*.scss".to_string(), "src/**/*.css".to_string()],
        vec!["styles".to_string()],
    )
    .unwrap();

    assert!(binding.matches(Path::new("src/scss/main.scss")));
    assert!(binding.matches(Path::new("src/scss/partials/_grid.scss")));
    assert!(binding.matches(Path::new("src/base.css")));
    assert!(!binding.matches(Path::new("src/app/main.ts")));
    assert!(!binding.matches(Path::new("dist/css/styles.css")));
}

#[test]
fn test_binding_from_rule() {
    let rule = WatchRule {
        patterns: vec!["test/**/*.spec.js".to_string()],
        tasks: vec!["test-app".to_string()],
    };
    let binding = WatchBinding::from_rule(&rule).unwrap();

    assert!(binding.matches(Path::new("test/app/login.spec.js")));
    assert_eq!(binding.tasks(), ["test-app".to_string()]);
}

#[test]
fn test_invalid_pattern() {
    let result = WatchBinding::new(vec!["src/[".to_string()], vec!["styles".to_string()]);

    assert!(matches!(result, Err(Error::InvalidPattern { .. })));
}

#[test]
fn test_triggered_tasks_unions_bindings() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();

    let bindings = vec![
        WatchBinding::new(
            vec!["src/**/*.scss".to_string()],
            vec!["scss-lint".to_string(), "scss".to_string()],
        )
        .unwrap(),
        WatchBinding::new(
            vec!["src/**/*".to_string()],
            vec!["reload".to_string()],
        )
        .unwrap(),
    ];
    let config = WatcherConfig {
        root: dir.path().to_path_buf(),
        debounce_ms: 300,
    };
    let watcher = FileWatcher::new(config, bindings).unwrap();

    let root = std::fs::canonicalize(dir.path()).unwrap();
    let event = notify::Event::new(notify::EventKind::Create(
        notify::event::CreateKind::File,
    ))
    .add_path(root.join("src/main.scss"));

    let (tasks, paths) = watcher.triggered_tasks(&event);
    assert_eq!(tasks.len(), 3);
    assert!(tasks.contains("scss-lint"));
    assert!(tasks.contains("scss"));
    assert!(tasks.contains("reload"));
    assert_eq!(paths, vec![std::path::PathBuf::from("src/main.scss")]);
}

#[test]
fn test_unmatched_event_triggers_nothing() {
    let dir = TempDir::new().unwrap();

    let bindings = vec![WatchBinding::new(
        vec!["src/**/*.scss".to_string()],
        vec!["scss".to_string()],
    )
    .unwrap()];
    let config = WatcherConfig {
        root: dir.path().to_path_buf(),
        debounce_ms: 300,
    };
    let watcher = FileWatcher::new(config, bindings).unwrap();

    let root = std::fs::canonicalize(dir.path()).unwrap();
    let event = notify::Event::new(notify::EventKind::Create(
        notify::event::CreateKind::File,
    ))
    .add_path(root.join("README.md"));

    let (tasks, paths) = watcher.triggered_tasks(&event);
    assert!(tasks.is_empty());
    assert!(paths.is_empty());
}
