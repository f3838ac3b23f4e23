//! snapshot — построение одного снапшота.
//!
//! Раскладка результата:
//! - <backup_root>/GD_<yyyyMMdd_HHmmss>/SteamFiles/   — полная копия program files;
//! - <backup_root>/GD_<stamp>/SaveFiles/              — все *.dat из save dir (без учёта регистра);
//! - <backup_root>/GD_<stamp>/checksums.json          — SHA-256 скопированных *.dat;
//! - <backup_root>/Assets/SaveAssets/                 — остальные файлы save dir (общий пул).
//!
//! Порядок:
//! 1) берём эксклюзивный lock на backup root;
//! 2) создаём каталог снапшота (существующий не переиспользуется);
//! 3) зеркалируем program files;
//! 4) один обход save dir: *.dat -> копия + хэш копии в манифест, остальное -> пул;
//! 5) пишем манифест.
//!
//! Хэш считается по скопированному файлу, а не по источнику: проверка потом
//! ловит и порчу при копировании.
//!
//! Любая ошибка ввода-вывода прерывает запуск. Откатов нет: уже скопированные
//! файлы остаются на диске, манифест не пишется.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::AppConfig;
use crate::consts::{
    PROGRAM_FILES_DIR, PROGRESS_EXT, SAVE_FILES_DIR, SNAPSHOT_PREFIX, SNAPSHOT_STAMP_FORMAT,
};
use crate::hash::sha256_file_hex;
use crate::lock::try_lock_backup_root;
use crate::manifest::{rel_key, write_manifest, Manifest};
use crate::pool::{AssetPool, PoolAction};
use crate::tree::mirror_tree;

/// Сводка по завершённому снапшоту.
#[derive(Debug, Clone)]
pub struct SnapshotReport {
    pub snapshot_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub pool_dir: PathBuf,

    pub program_files: u64,
    pub program_bytes: u64,

    pub progress_files: u64,

    pub assets_added: u64,
    pub assets_overwritten: u64,
    pub assets_skipped: u64,
}

/// Является ли файл "progress"-файлом (расширение .dat без учёта регистра).
pub fn is_progress_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(PROGRESS_EXT))
        .unwrap_or(false)
}

/// Имя каталога снапшота для метки времени.
pub fn snapshot_dir_name(stamp: &str) -> String {
    format!("{SNAPSHOT_PREFIX}{stamp}")
}

/// Текущая локальная метка времени (yyyyMMdd_HHmmss).
pub fn local_stamp() -> String {
    Local::now().format(SNAPSHOT_STAMP_FORMAT).to_string()
}

// Backup root внутри источника: обход зациклится на собственных снапшотах.
fn ensure_outside(backup_root: &Path, source: &Path) -> Result<()> {
    let root = fs::canonicalize(backup_root)
        .with_context(|| format!("canonicalize {}", backup_root.display()))?;
    let src = fs::canonicalize(source)
        .with_context(|| format!("canonicalize {}", source.display()))?;
    if root.starts_with(&src) {
        return Err(anyhow!(
            "backup root {} lies inside source {}",
            backup_root.display(),
            source.display()
        ));
    }
    Ok(())
}

pub struct SnapshotBuilder<'a> {
    cfg: &'a AppConfig,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(cfg: &'a AppConfig) -> Self {
        Self { cfg }
    }

    /// Снапшот с текущей локальной меткой времени.
    pub fn run(&self) -> Result<SnapshotReport> {
        self.run_at(&local_stamp())
    }

    /// Снапшот с явной меткой (каталог GD_<stamp>).
    pub fn run_at(&self, stamp: &str) -> Result<SnapshotReport> {
        let cfg = self.cfg;
        if !cfg.save_dir.is_dir() {
            return Err(anyhow!("save dir {} is not a directory", cfg.save_dir.display()));
        }
        if !cfg.assets_dir.is_dir() {
            return Err(anyhow!(
                "program files dir {} is not a directory",
                cfg.assets_dir.display()
            ));
        }

        fs::create_dir_all(&cfg.backup_root)
            .with_context(|| format!("create backup root {}", cfg.backup_root.display()))?;
        ensure_outside(&cfg.backup_root, &cfg.save_dir)?;
        ensure_outside(&cfg.backup_root, &cfg.assets_dir)?;
        let _lock = try_lock_backup_root(&cfg.backup_root)?;

        let snapshot_dir = cfg.backup_root.join(snapshot_dir_name(stamp));
        // create_dir (не _all): существующий снапшот не трогаем
        fs::create_dir(&snapshot_dir)
            .with_context(|| format!("create snapshot dir {}", snapshot_dir.display()))?;
        let program_dir = snapshot_dir.join(PROGRAM_FILES_DIR);
        let progress_dir = snapshot_dir.join(SAVE_FILES_DIR);
        fs::create_dir_all(&program_dir)
            .with_context(|| format!("create {}", program_dir.display()))?;
        fs::create_dir_all(&progress_dir).with_context(|| format!("create {}", progress_dir.display()))?;
        let pool = AssetPool::open_or_create(&AssetPool::dir_for(&cfg.backup_root))?;

        info!(
            "snapshot: start, save_dir={}, assets_dir={}, out={}",
            cfg.save_dir.display(),
            cfg.assets_dir.display(),
            snapshot_dir.display()
        );

        // 1) program files — всегда полностью
        let tree = mirror_tree(&cfg.assets_dir, &program_dir)?;

        let mut report = SnapshotReport {
            snapshot_dir: snapshot_dir.clone(),
            manifest_path: PathBuf::new(),
            pool_dir: pool.dir_path().to_path_buf(),
            program_files: tree.files,
            program_bytes: tree.bytes,
            progress_files: 0,
            assets_added: 0,
            assets_overwritten: 0,
            assets_skipped: 0,
        };

        // 2) save dir — один обход, ветвление только по расширению
        let mut manifest = Manifest::new();
        for entry in WalkDir::new(&cfg.save_dir).min_depth(1).follow_links(true) {
            let entry = entry.with_context(|| format!("walk {}", cfg.save_dir.display()))?;
            if entry.file_type().is_dir() {
                continue;
            }
            let src = entry.path();
            let rel = src
                .strip_prefix(&cfg.save_dir)
                .with_context(|| format!("strip prefix {}", cfg.save_dir.display()))?;

            if is_progress_file(src) {
                // ключ до копирования: имя не в UTF-8 прерывает запуск, не оставив копию файла
                let key = rel_key(&Path::new(SAVE_FILES_DIR).join(rel))?;
                let dest = progress_dir.join(rel);
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("create {}", parent.display()))?;
                }
                fs::copy(src, &dest)
                    .with_context(|| format!("copy {} -> {}", src.display(), dest.display()))?;

                let digest = sha256_file_hex(&dest)?;
                info!("snapshot: saved {} {}", rel.display(), digest);
                manifest.insert(key, digest);
                report.progress_files += 1;
            } else {
                match pool.sync(src, rel)? {
                    PoolAction::Added => report.assets_added += 1,
                    PoolAction::Overwritten => report.assets_overwritten += 1,
                    PoolAction::Skipped => report.assets_skipped += 1,
                }
            }
        }

        // 3) манифест — последним
        report.manifest_path = write_manifest(&snapshot_dir, &manifest)?;
        debug!("snapshot: manifest {} entries", manifest.len());

        info!(
            "snapshot: done, program_files={}, progress_files={}, assets(added={}, updated={}, skipped={}), out={}",
            report.program_files,
            report.progress_files,
            report.assets_added,
            report.assets_overwritten,
            report.assets_skipped,
            snapshot_dir.display()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_classification_is_case_insensitive() {
        assert!(is_progress_file(Path::new("CCGameManager.dat")));
        assert!(is_progress_file(Path::new("dir/CCLocalLevels.DAT")));
        assert!(is_progress_file(Path::new("x.Dat")));
        assert!(!is_progress_file(Path::new("bg.png")));
        assert!(!is_progress_file(Path::new("dat")));
        assert!(!is_progress_file(Path::new("archive.dat.bak")));
    }

    #[test]
    fn snapshot_dir_name_format() {
        assert_eq!(snapshot_dir_name("20240102_030405"), "GD_20240102_030405");
        let s = local_stamp();
        assert_eq!(s.len(), 15);
        assert_eq!(&s[8..9], "_");
        assert!(s.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }
}
