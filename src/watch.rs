use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use gox_transpiler::Options;
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEvent, new_debouncer};
use tracing::{info, warn};

use crate::{CliError, collect_sources, generate_file, is_gox, print_generated, remove_generated, report};

/// Generate every `.gox` file under `dir`, then keep regenerating on change.
/// A removed source takes its generated file with it. Compile errors are
/// reported and the loop continues.
pub(crate) fn run_watch(dir: &Path, options: &Options) -> Result<(), CliError> {
    if !dir.is_dir() {
        return Err(CliError::Missing(dir.to_path_buf()));
    }

    for path in collect_sources(dir) {
        regenerate(&path, options);
    }

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(200), tx)
        .map_err(|e| CliError::Watch(format!("watcher init: {e}")))?;
    debouncer
        .watcher()
        .watch(dir, RecursiveMode::Recursive)
        .map_err(|e| CliError::Watch(format!("{}: {e}", dir.display())))?;

    info!(path = %dir.display(), "watching for changes");

    for result in rx {
        match result {
            Ok(events) => {
                for path in changed_sources(&events) {
                    if path.exists() {
                        regenerate(&path, options);
                    } else {
                        match remove_generated(&path) {
                            Ok(true) => info!(source = %path.display(), "removed generated file"),
                            Ok(false) => {}
                            Err(err) => report(&err),
                        }
                    }
                }
            }
            Err(e) => warn!("watcher error: {e:?}"),
        }
    }

    Err(CliError::Watch("file watcher disconnected".to_string()))
}

/// Distinct `.gox` paths touched by a batch of events
fn changed_sources(events: &[DebouncedEvent]) -> BTreeSet<PathBuf> {
    events
        .iter()
        .filter(|event| is_gox(&event.path))
        .map(|event| event.path.clone())
        .collect()
}

fn regenerate(path: &Path, options: &Options) {
    match generate_file(path, options) {
        Ok(output) => print_generated(&output.display().to_string()),
        Err(err) => report(&err),
    }
}
