//! pool — общий пул крупных медиа-ассетов (дедупликация между запусками).
//!
//! Пул один на backup root: <backup_root>/Assets/SaveAssets.
//! Адресация по относительному пути (не по хэшу содержимого).
//!
//! Политика sync(src, rel):
//! - назначение существует И длина совпадает с источником → Skipped;
//! - иначе → создать родительские каталоги и скопировать поверх (Added/Overwritten).
//!
//! Сравнение только по размеру: два разных файла одинаковой длины считаются
//! одинаковыми. Полный пересчёт хэшей всех ассетов на каждом запуске сюда не входит.
//! Пул никогда не чистится этим инструментом.

use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::{ASSET_POOL_DIR, ASSET_POOL_SUBDIR};

/// Что сделал пул с конкретным файлом.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolAction {
    /// Копия уже есть и размер совпадает.
    Skipped,
    /// Файла в пуле не было.
    Added,
    /// Файл был, но размер отличался.
    Overwritten,
}

pub struct AssetPool {
    dir: PathBuf,
}

impl AssetPool {
    /// Путь пула для данного backup root.
    pub fn dir_for(backup_root: &Path) -> PathBuf {
        backup_root.join(ASSET_POOL_DIR).join(ASSET_POOL_SUBDIR)
    }

    /// Открыть пул в каталоге `dir`, создав его при необходимости.
    pub fn open_or_create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create asset pool {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir_path(&self) -> &Path {
        &self.dir
    }

    /// Путь файла внутри пула.
    pub fn entry_path(&self, rel: &Path) -> PathBuf {
        self.dir.join(rel)
    }

    /// Синхронизировать один файл источника с пулом.
    pub fn sync(&self, src: &Path, rel: &Path) -> Result<PoolAction> {
        let dest = self.entry_path(rel);

        let src_len = fs::metadata(src)
            .with_context(|| format!("stat asset {}", src.display()))?
            .len();

        let action = match fs::metadata(&dest) {
            Ok(m) if m.is_file() && m.len() == src_len => {
                debug!("pool: unchanged {} ({} B)", rel.display(), src_len);
                return Ok(PoolAction::Skipped);
            }
            Ok(_) => PoolAction::Overwritten,
            Err(_) => PoolAction::Added,
        };

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::copy(src, &dest)
            .with_context(|| format!("copy asset {} -> {}", src.display(), dest.display()))?;

        info!(
            "pool: {} {} ({} B)",
            match action {
                PoolAction::Overwritten => "updated",
                _ => "added",
            },
            rel.display(),
            src_len
        );
        Ok(action)
    }
}
