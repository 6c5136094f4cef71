//! Task execution command.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;

use gantry_core::{RunReport, TaskRunner, TaskStatus};

use crate::formatting::{
    create_progress_bar, format_duration, print_section_header, print_separator_with_spacing,
    print_success, print_summary_box, print_warning, SectionStyle, Status,
};

use super::{load_graph, project_root};

pub fn cmd_run(
    manifest_path: PathBuf,
    tasks: Vec<String>,
    parallel: Option<usize>,
    no_stream: bool,
) -> Result<()> {
    let start = Instant::now();
    let (manifest, graph) = load_graph(&manifest_path)?;

    let tasks = if tasks.is_empty() {
        if graph.get_task("default").is_some() {
            vec!["default".to_string()]
        } else {
            print_warning("No tasks requested and no 'default' task defined");
            return Ok(());
        }
    } else {
        tasks
    };

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || {
            cancel.store(true, Ordering::SeqCst);
        })
        .map_err(|e| anyhow::anyhow!("Failed to set signal handler: {}", e))?;
    }

    let closure_size = graph.closure(&tasks)?.len();

    print_section_header("Running tasks", SectionStyle::Primary);

    let runner = TaskRunner::new(project_root(&manifest_path), graph)
        .with_max_parallel(parallel.or(manifest.settings.default_parallel))
        .with_cancel_flag(cancel);

    let report = if no_stream {
        let pb = create_progress_bar(closure_size as u64);
        pb.set_message("Running...");
        let report = runner.run(&tasks)?;
        pb.finish_and_clear();
        report
    } else {
        runner.run_with_output(&tasks, |task, line, is_stderr| {
            let prefix = format!("[{}]", task);
            if is_stderr {
                eprintln!("  {} {}", prefix.bright_black().bold(), line.bright_red());
            } else {
                println!("  {} {}", prefix.bright_black().bold(), line);
            }
        })?
    };

    let failed = print_run_report(&report);

    print_separator_with_spacing();

    let duration_str = format_duration(start.elapsed().as_secs_f64());
    print_summary_box("Summary", &[("Duration", &duration_str)]);
    println!();

    if failed {
        std::process::exit(1);
    }

    Ok(())
}

fn print_run_report(report: &RunReport) -> bool {
    print_section_header("Results", SectionStyle::Primary);
    println!();

    let mut table = Table::new();
    table
        .set_header(vec![
            Cell::new("Status").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Task").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Duration").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Details").add_attribute(comfy_table::Attribute::Bold),
        ])
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);

    let mut done = 0;
    let mut failed = 0;
    let mut skipped = 0;

    for result in &report.results {
        let duration = format_duration(result.duration.as_secs_f64());
        match result.status {
            TaskStatus::Done => {
                table.add_row(vec![
                    Cell::new(Status::Success.symbol()).fg(comfy_table::Color::Green),
                    Cell::new(&result.task_name).fg(comfy_table::Color::White),
                    Cell::new(duration).fg(comfy_table::Color::DarkGrey),
                    Cell::new(""),
                ]);
                done += 1;
            }
            TaskStatus::Failed => {
                let details = if result.stderr.trim().is_empty() {
                    "command exited with a non-zero status".to_string()
                } else {
                    result.stderr.trim().to_string()
                };
                table.add_row(vec![
                    Cell::new(Status::Error.symbol()).fg(comfy_table::Color::Red),
                    Cell::new(&result.task_name).fg(comfy_table::Color::Red),
                    Cell::new(duration).fg(comfy_table::Color::DarkGrey),
                    Cell::new(details).fg(comfy_table::Color::Red),
                ]);
                failed += 1;
            }
            _ => {
                table.add_row(vec![
                    Cell::new(Status::Warning.symbol()).fg(comfy_table::Color::Yellow),
                    Cell::new(&result.task_name).fg(comfy_table::Color::Yellow),
                    Cell::new(duration).fg(comfy_table::Color::DarkGrey),
                    Cell::new("skipped: dependency failed").fg(comfy_table::Color::Yellow),
                ]);
                skipped += 1;
            }
        }
    }

    println!("{}", table);
    println!();

    if failed > 0 || skipped > 0 {
        print_warning(&format!(
            "{} done, {} failed, {} skipped",
            done, failed, skipped
        ));
    } else {
        print_success(&format!("All {} tasks completed", done));
    }

    failed > 0 || skipped > 0
}
