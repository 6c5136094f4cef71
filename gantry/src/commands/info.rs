//! Task listing and graph inspection commands.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::formatting::{
    print_key_value, print_section_header, print_success, print_task_table, print_warning,
    SectionStyle,
};

use super::load_graph;

pub fn cmd_list(manifest_path: PathBuf, json: bool) -> Result<()> {
    let (_, graph) = load_graph(&manifest_path)?;

    if json {
        let tasks: BTreeMap<String, Vec<String>> = graph
            .all_tasks()
            .iter()
            .map(|t| (t.name.clone(), t.deps.to_vec()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    print_section_header("Available Tasks", SectionStyle::Primary);
    println!();

    if graph.is_empty() {
        print_warning("No tasks defined");
    } else {
        let rows: Vec<(String, String, String)> = graph
            .all_tasks()
            .iter()
            .map(|t| {
                (
                    t.name.clone(),
                    t.deps.join(", "),
                    t.command.clone().unwrap_or_else(|| "(aggregate)".to_string()),
                )
            })
            .collect();
        print_task_table(&rows);
    }
    println!();

    Ok(())
}

pub fn cmd_graph(manifest_path: PathBuf, json: bool) -> Result<()> {
    let (_, graph) = load_graph(&manifest_path)?;

    if json {
        let value = serde_json::json!({
            "order": graph.topological_order(),
            "levels": graph.dependency_levels(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_section_header("Task Graph", SectionStyle::Primary);
    print_key_value("Tasks", &graph.len().to_string());
    println!();

    for (i, level) in graph.dependency_levels().iter().enumerate() {
        print_key_value(&format!("Level {}", i), &level.join(", "));
    }
    println!();

    Ok(())
}

pub fn cmd_validate(manifest_path: PathBuf, json: bool) -> Result<()> {
    let _ = load_graph(&manifest_path)?;

    if json {
        println!("{{\"valid\": true}}");
    } else {
        print_section_header("Validation", SectionStyle::Success);
        print_success("All task dependencies resolve");
        print_success("No circular dependencies detected");
        println!();
    }

    Ok(())
}
