use std::fs;

use tempfile::TempDir;

use gantry_core::config::{Manifest, TaskValue};
use gantry_core::error::Error;

const MANIFEST: &str = r#"
[tasks]
clean = "rm -rf dist build"
scss-lint = "scss-lint src/scss"
scss = { command = "sass src/scss/main.scss dist/css/styles.css", depends_on = ["scss-lint"] }
styles = { depends_on = ["scss"], description = "Lint and compile stylesheets" }

[[watch]]
patterns = ["src/scss/**/*.scss"]
tasks = ["styles"]

[[watch]]
patterns = ["src/**/*.html", "src/**/*.json"]
tasks = ["clean"]

[settings]
default_parallel = 2
debounce_ms = 150
"#;

#[test]
fn test_parse_manifest() {
    let manifest: Manifest = toml::from_str(MANIFEST).unwrap();

    assert_eq!(manifest.tasks.len(), 4);
    assert!(matches!(
        manifest.tasks.get("clean"),
        Some(TaskValue::Simple(cmd)) if cmd == "rm -rf dist build"
    ));
    assert_eq!(manifest.watch.len(), 2);
    assert_eq!(manifest.settings.default_parallel, Some(2));
    assert_eq!(manifest.settings.debounce_ms, Some(150));
}

#[test]
fn test_parse_manifest_defaults() {
    let manifest: Manifest = toml::from_str("").unwrap();

    assert!(manifest.tasks.is_empty());
    assert!(manifest.watch.is_empty());
    assert_eq!(manifest.settings.default_parallel, None);
    assert_eq!(manifest.settings.debounce_ms, None);
}

#[test]
fn test_to_tasks_preserves_declaration_order() {
    let manifest: Manifest = toml::from_str(MANIFEST).unwrap();
    let tasks = manifest.to_tasks();

    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["clean", "scss-lint", "scss", "styles"]);
}

#[test]
fn test_detailed_task_dependencies() {
    let manifest: Manifest = toml::from_str(MANIFEST).unwrap();
    let tasks = manifest.to_tasks();

    let scss = tasks.iter().find(|t| t.name == "scss").unwrap();
    assert_eq!(scss.deps.as_slice(), ["scss-lint".to_string()]);
    assert!(scss.has_action());
}

#[test]
fn test_aggregate_task_from_manifest() {
    let manifest: Manifest = toml::from_str(MANIFEST).unwrap();
    let tasks = manifest.to_tasks();

    let styles = tasks.iter().find(|t| t.name == "styles").unwrap();
    assert!(!styles.has_action());
    assert_eq!(styles.deps.as_slice(), ["scss".to_string()]);
    assert_eq!(
        styles.description.as_deref(),
        Some("Lint and compile stylesheets")
    );
}

#[test]
fn test_to_registry() {
    let manifest: Manifest = toml::from_str(MANIFEST).unwrap();
    let registry = manifest.to_registry().unwrap();

    assert_eq!(registry.len(), 4);
    assert!(registry.contains("scss"));
}

#[test]
fn test_load_missing_manifest() {
    let dir = TempDir::new().unwrap();
    let result = Manifest::load(&dir.path().join("gantry.toml"));

    assert!(matches!(result, Err(Error::ManifestNotFound(_))));
}

#[test]
fn test_load_invalid_manifest_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gantry.toml");
    fs::write(&path, "[tasks]\nclean = 42\n").unwrap();

    match Manifest::load(&path) {
        Err(Error::Toml { context, .. }) => {
            assert!(context.contains("gantry.toml"));
        }
        other => panic!("expected Toml error, got {:?}", other),
    }
}

#[test]
fn test_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gantry.toml");
    fs::write(&path, MANIFEST).unwrap();

    let manifest = Manifest::load(&path).unwrap();
    assert_eq!(manifest.tasks.len(), 4);
}
