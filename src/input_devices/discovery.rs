use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SetupError;

pub const DEFAULT_INPUT_DIR: &str = "/dev/input";

/// Lists `eventN` nodes under `dir`, ordered by `N`.
///
/// Numeric order keeps `event10` after `event9`, which is the order the
/// kernel registered them in.
pub fn event_nodes(dir: &Path) -> Result<Vec<PathBuf>, SetupError> {
    let entries = fs::read_dir(dir).map_err(|source| SetupError::Enumerate {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut nodes: Vec<(u32, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name();
            let index = name.to_str()?.strip_prefix("event")?.parse::<u32>().ok()?;
            Some((index, entry.path()))
        })
        .collect();

    nodes.sort_by_key(|(index, _)| *index);
    Ok(nodes.into_iter().map(|(_, path)| path).collect())
}
