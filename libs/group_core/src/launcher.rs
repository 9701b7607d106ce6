use std::path::Path;

use thiserror::Error;

use crate::model::GroupRecord;

#[derive(Debug, Error)]
#[error("failed to launch {target}: {message}")]
pub struct LaunchError {
    pub target: String,
    pub message: String,
}

/// Starts one item: an executable, a shortcut or a URL file.
pub trait ItemLauncher: Send + Sync {
    fn launch(&self, target: &Path, args: &[String]) -> Result<(), LaunchError>;
}

/// Splits an item's argument string the way a shell would; an unbalanced
/// quote passes the whole string through as one argument.
pub fn split_args(args: Option<&str>) -> Vec<String> {
    match args.map(str::trim).filter(|a| !a.is_empty()) {
        Some(args) => shlex::split(args).unwrap_or_else(|| vec![args.to_string()]),
        None => Vec::new(),
    }
}

/// Launches every item of `group` in display order and returns how many
/// started. A failing item is logged and skipped.
pub fn launch_group(launcher: &dyn ItemLauncher, group: &GroupRecord) -> usize {
    let mut launched = 0;
    for item in &group.items {
        let args = split_args(item.args.as_deref());
        match launcher.launch(&item.file_path, &args) {
            Ok(()) => {
                tracing::info!(group = %group.group_name, item = %item.file_path.display(), "launched");
                launched += 1;
            }
            Err(e) => tracing::warn!(group = %group.group_name, error = %e, "item launch failed"),
        }
    }
    launched
}
