//! Leveled compaction: drains level `i` into level `i + 1`.
//!
//! Every table of level `i` is merged with the level `i + 1` tables whose
//! key range overlaps it, using the k-way [`sstable::merge`]. The result is
//! written as one new table in level `i + 1`, and only then are the inputs
//! dropped from the levels and deleted from disk.

use sstable::{merge, merge_keep_tombstones, Table};
use tracing::{info, warn};

use crate::disk::DiskManager;
use crate::level::{key_range, Level};
use crate::{EngineError, Result};

impl DiskManager {
    /// Compacts every level whose table count exceeds its target.
    ///
    /// Walks by index so a level created or grown by the previous step is
    /// checked too.
    pub(crate) fn check_and_compact(&self, levels: &mut Vec<Level>) -> Result<()> {
        let mut i = 0;
        while i < levels.len() {
            if levels[i].len() > self.capacity(i) {
                self.compact(levels, i)?;
            }
            i += 1;
        }
        Ok(())
    }

    pub(crate) fn compact(&self, levels: &mut Vec<Level>, i: usize) -> Result<()> {
        let Some((start, end)) = levels.get(i).and_then(Level::key_range) else {
            return Err(EngineError::Merge(format!("level {} is empty", i)));
        };
        if levels.len() == i + 1 {
            levels.push(Level::new());
        }

        let targets = levels[i + 1].overlapping(&start, &end);

        // Most recent first: level i newest to oldest, then the targets.
        let mut streams = Vec::with_capacity(levels[i].len() + targets.len());
        for table in levels[i].tables().iter().rev() {
            streams.push(table.get_all_entries()?);
        }
        for &t in targets.iter().rev() {
            streams.push(levels[i + 1].tables()[t].get_all_entries()?);
        }

        let inputs = levels[i]
            .tables()
            .iter()
            .chain(targets.iter().map(|&t| &levels[i + 1].tables()[t]));
        let Some((lo, hi)) = key_range(inputs) else {
            return Err(EngineError::Merge(format!("level {} is empty", i)));
        };

        // Tombstones may only go once nothing older can be shadowed by them.
        let shadows_deeper = levels
            .iter()
            .skip(i + 2)
            .any(|level| !level.overlapping(&lo, &hi).is_empty());
        let merged = if shadows_deeper {
            merge_keep_tombstones(streams)
        } else {
            merge(streams)
        };

        let output = if merged.is_empty() {
            None
        } else {
            Some(self.create_table(&merged, (i + 1) as u64)?)
        };

        let sources = levels[i].take_all();
        let replaced = levels[i + 1].remove(&targets);
        info!(
            from = i,
            to = i + 1,
            sources = sources.len(),
            targets = replaced.len(),
            records = merged.len(),
            output = ?output.as_ref().map(|t| t.path().display().to_string()),
            "compacted level"
        );
        if let Some(table) = output {
            levels[i + 1].push(table);
        }

        remove_files(sources.into_iter().chain(replaced))
    }
}

/// Deletes the files of superseded tables.
///
/// Every file is attempted; the first failure is returned.
fn remove_files<I: IntoIterator<Item = Table>>(tables: I) -> Result<()> {
    let mut first_err = None;
    for table in tables {
        let path = table.path().to_path_buf();
        if let Err(e) = table.remove_file() {
            warn!(path = %path.display(), error = %e, "failed to delete compacted table");
            first_err.get_or_insert(e);
        }
    }
    match first_err {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
