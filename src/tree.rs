//! tree — полное зеркалирование дерева каталогов (program files).
//!
//! Обход через walkdir в pre-order: каталог всегда встречается раньше своего
//! содержимого, поэтому он создаётся в назначении до копирования файлов в него.
//! Пустые каталоги тоже переносятся. Файлы перезаписываются безусловно.

use anyhow::{anyhow, Context, Result};
use log::info;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Итог полного копирования дерева.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeCopyStats {
    pub dirs: u64,
    pub files: u64,
    pub bytes: u64,
}

/// Скопировать всё дерево `src` в `dst` (dst создаётся при необходимости).
/// Любая ошибка ввода-вывода прерывает копирование.
pub fn mirror_tree(src: &Path, dst: &Path) -> Result<TreeCopyStats> {
    if !src.is_dir() {
        return Err(anyhow!("source tree {} is not a directory", src.display()));
    }
    info!("tree: mirror start, src={}, dst={}", src.display(), dst.display());

    fs::create_dir_all(dst).with_context(|| format!("create {}", dst.display()))?;

    let mut stats = TreeCopyStats::default();
    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry.with_context(|| format!("walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("strip prefix {}", src.display()))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("create {}", target.display()))?;
            stats.dirs += 1;
        } else {
            let n = fs::copy(entry.path(), &target).with_context(|| {
                format!("copy {} -> {}", entry.path().display(), target.display())
            })?;
            info!("tree: copied {} ({} B)", rel.display(), n);
            stats.files += 1;
            stats.bytes += n;
        }
    }

    info!(
        "tree: mirror done, dirs={}, files={}, bytes={}",
        stats.dirs, stats.files, stats.bytes
    );
    Ok(stats)
}
