//! Watch mode command.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use owo_colors::OwoColorize;

use gantry_core::{FileWatcher, TaskRunner, WatchBinding, WatcherConfig};

use crate::formatting::{
    print_error, print_key_value, print_section_header, print_success, print_warning, SectionStyle,
};

use super::{load_graph, project_root};

pub fn cmd_watch(
    manifest_path: PathBuf,
    tasks: Vec<String>,
    debounce_ms: Option<u64>,
) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let running = Arc::clone(&running);
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
            cancel.store(true, Ordering::SeqCst);
        })
        .map_err(|e| anyhow::anyhow!("Failed to set signal handler: {}", e))?;
    }

    let (manifest, graph) = load_graph(&manifest_path)?;

    if manifest.watch.is_empty() {
        print_warning("No watch bindings defined in the manifest");
        return Ok(());
    }

    let bindings = manifest
        .watch
        .iter()
        .map(WatchBinding::from_rule)
        .collect::<gantry_core::Result<Vec<_>>>()?;

    let debounce = debounce_ms.or(manifest.settings.debounce_ms).unwrap_or(300);
    let debounce_duration = Duration::from_millis(debounce);
    let root = project_root(&manifest_path);

    print_section_header("Watch Mode", SectionStyle::Primary);
    print_key_value("Watching", &root.display().to_string());
    for binding in &bindings {
        print_key_value(&binding.patterns().join(", "), &binding.tasks().join(", "));
    }
    if !tasks.is_empty() {
        print_key_value("Restricted to", &tasks.join(", "));
    }
    println!("  Press Ctrl+C to stop");
    println!();

    let watcher_config = WatcherConfig {
        root: root.clone(),
        debounce_ms: debounce,
    };
    let mut watcher = FileWatcher::new(watcher_config, bindings)?;

    let runner = TaskRunner::new(&root, graph)
        .with_max_parallel(manifest.settings.default_parallel)
        .with_cancel_flag(cancel);

    let mut pending_tasks: HashSet<String> = HashSet::new();
    let mut last_event_time = Instant::now();

    loop {
        if !running.load(Ordering::SeqCst) {
            println!();
            print_warning("Stopping watch mode...");
            break;
        }

        match watcher.next_event() {
            Ok(Some(event)) => {
                let (triggered, paths) = watcher.triggered_tasks(&event);
                if !triggered.is_empty() {
                    for path in &paths {
                        tracing::info!("changed: {}", path.display());
                    }
                    pending_tasks.extend(triggered);
                    last_event_time = Instant::now();
                }
            }
            Ok(None) => {
                if !pending_tasks.is_empty() && last_event_time.elapsed() >= debounce_duration {
                    let mut to_run: Vec<String> = if tasks.is_empty() {
                        pending_tasks.iter().cloned().collect()
                    } else {
                        pending_tasks
                            .iter()
                            .filter(|t| tasks.contains(*t))
                            .cloned()
                            .collect()
                    };
                    to_run.sort();
                    pending_tasks.clear();

                    if to_run.is_empty() {
                        print_success("No matching tasks to run");
                        println!();
                        continue;
                    }

                    print_warning("Change detected, running tasks...");

                    // The run happens inline in the consumer loop; events
                    // arriving mid-run queue in the channel and form the
                    // next pending set, so triggers coalesce instead of
                    // overlapping.
                    let report = runner.run_with_output(&to_run, |task, line, is_stderr| {
                        let prefix = format!("[{}]", task);
                        if is_stderr {
                            eprintln!("  {} {}", prefix.bright_black().bold(), line.bright_red());
                        } else {
                            println!("  {} {}", prefix.bright_black().bold(), line);
                        }
                    })?;

                    if report.success() {
                        print_success("Run complete");
                    } else if let Some(failure) = report.first_failure() {
                        print_error(&format!("{} failed", failure.task_name));
                        for skipped in report.skipped() {
                            print_warning(&format!("{} skipped", skipped.task_name));
                        }
                    }
                    println!();
                } else {
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
            Err(_) => {
                break;
            }
        }
    }

    Ok(())
}
