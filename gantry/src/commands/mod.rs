//! Command implementations for the CLI.

mod info;
mod run;
mod watch;

use std::path::{Path, PathBuf};

use anyhow::Result;
use gantry_core::{Manifest, TaskGraph};

pub use info::{cmd_graph, cmd_list, cmd_validate};
pub use run::cmd_run;
pub use watch::cmd_watch;

fn load_graph(manifest_path: &Path) -> Result<(Manifest, TaskGraph)> {
    let manifest = Manifest::load(manifest_path)?;
    let registry = manifest.to_registry()?;
    let graph = TaskGraph::new(&registry)?;
    Ok((manifest, graph))
}

/// The directory containing the manifest; tasks execute relative to it.
fn project_root(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
