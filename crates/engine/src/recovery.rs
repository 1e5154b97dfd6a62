/// Cold-start path: rebuilding the levels from the table files in the
/// storage directory.
///
/// There is no manifest. A table's level and sequence number are encoded in
/// its file name (`L<level>_<seq>-<nanos>.data`), and the header repeats the
/// level as a cross-check. Sequence numbers are assigned by the engine, so
/// recency does not depend on the wall clock.
use sstable::{parse_table_file_name, BloomParams, Table, TMP_EXTENSION};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::level::Level;
use crate::{EngineError, Result};

/// Scans `dir` and opens every table into its level, oldest first.
///
/// Returns the levels and the sequence number the next table should get:
/// one past the largest found, or 0 for an empty directory.
///
/// Leftover temp files from interrupted writes are deleted. Files that do
/// not look like tables are ignored. The levels always include level 0.
pub(crate) fn load_levels(dir: &Path, params: BloomParams) -> Result<(Vec<Level>, u64)> {
    cleanup_tmp_files(dir);

    let mut found: Vec<(u64, u64, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((level, seq)) = parse_table_file_name(name) {
            found.push((level, seq, path.clone()));
        }
    }
    found.sort();

    let next_seq = found
        .iter()
        .map(|(_, seq, _)| seq.saturating_add(1))
        .max()
        .unwrap_or(0);

    let mut levels: Vec<Vec<Table>> = vec![Vec::new()];
    for (level, seq, path) in found {
        let table = Table::open(&path, params)?;
        if table.level() != level {
            return Err(EngineError::Decode(format!(
                "{} is named for level {} but its header says {}",
                path.display(),
                level,
                table.level()
            )));
        }
        let idx = usize::try_from(level)
            .map_err(|_| EngineError::Decode(format!("level {} out of range", level)))?;
        if levels.len() <= idx {
            levels.resize_with(idx + 1, Vec::new);
        }
        debug!(path = %path.display(), level, seq, records = table.len(), "loaded table");
        levels[idx].push(table);
    }

    Ok((levels.into_iter().map(Level::from_tables).collect(), next_seq))
}

/// Removes leftover `.data.tmp` files from interrupted table writes.
pub(crate) fn cleanup_tmp_files(dir: &Path) {
    let suffix = format!(".{}", TMP_EXTENSION);
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let p = entry.path();
            if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(&suffix) {
                    match std::fs::remove_file(&p) {
                        Ok(()) => debug!(path = %p.display(), "removed temp file"),
                        Err(e) => warn!(path = %p.display(), error = %e, "failed to remove temp file"),
                    }
                }
            }
        }
    }
}
