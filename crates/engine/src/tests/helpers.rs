use crate::EngineConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Config rooted at `dir` with a tiny memtable and compaction effectively
/// disabled, so tests decide when tables move.
pub fn small_config(dir: &Path) -> EngineConfig {
    EngineConfig::new(dir)
        .with_memtable_threshold(64)
        .with_bloom(1000, 0.01)
        .with_l0_target(1000)
}

pub fn count_table_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext == "data")
                .unwrap_or(false)
        })
        .count()
}

/// Table files in `dir`, sorted by name.
pub fn table_paths(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "data") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

pub fn key(i: usize) -> Vec<u8> {
    format!("k{:04}", i).into_bytes()
}
