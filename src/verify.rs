//! verify — повторная проверка снапшота по его checksums.json.
//!
//! Только чтение. Каждая запись манифеста проверяется независимо, первая же
//! ошибка не останавливает проверку остальных.
//!
//! Исходы:
//! - манифеста нет → VerifyReport::NoManifest (не ошибка: старые снапшоты);
//! - манифест не парсится → Err;
//! - иначе → VerifyReport::Checked со списком проблемных путей
//!   (файл отсутствует / хэш не совпал / файл не читается).

use anyhow::Result;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::Path;

use crate::hash::{digest_eq, sha256_file_hex};
use crate::manifest::{key_to_path, manifest_path, read_manifest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Файла нет по пути <snapshot>/<key>.
    Missing,
    /// Пересчитанный хэш не совпал с записанным.
    Mismatch,
    /// Файл есть, но прочитать его не удалось.
    Unreadable,
    /// Ключ выходит за пределы снапшота.
    InvalidPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyFailure {
    pub path: String,
    pub kind: FailureKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyReport {
    NoManifest,
    Checked {
        checked: usize,
        failures: Vec<VerifyFailure>,
    },
}

impl VerifyReport {
    /// Манифест найден и все записи совпали.
    pub fn is_ok(&self) -> bool {
        matches!(self, VerifyReport::Checked { failures, .. } if failures.is_empty())
    }

    /// Относительные пути, не прошедшие проверку (в порядке манифеста).
    pub fn corrupted_paths(&self) -> Vec<&str> {
        match self {
            VerifyReport::NoManifest => Vec::new(),
            VerifyReport::Checked { failures, .. } => {
                failures.iter().map(|f| f.path.as_str()).collect()
            }
        }
    }
}

/// Проверить снапшот в каталоге `snapshot_dir`.
pub fn verify_snapshot(snapshot_dir: &Path) -> Result<VerifyReport> {
    let manifest = match read_manifest(snapshot_dir)? {
        Some(m) => m,
        None => {
            info!("verify: no manifest at {}", manifest_path(snapshot_dir).display());
            return Ok(VerifyReport::NoManifest);
        }
    };

    info!(
        "verify: start, snapshot={}, entries={}",
        snapshot_dir.display(),
        manifest.len()
    );

    let mut failures = Vec::new();
    for (key, expected) in manifest.iter() {
        let kind = match check_entry(snapshot_dir, key, expected) {
            None => {
                debug!("verify: ok {}", key);
                continue;
            }
            Some(k) => k,
        };
        warn!("verify: {:?} {}", kind, key);
        failures.push(VerifyFailure {
            path: key.to_string(),
            kind,
        });
    }

    info!(
        "verify: done, checked={}, failures={}",
        manifest.len(),
        failures.len()
    );
    Ok(VerifyReport::Checked {
        checked: manifest.len(),
        failures,
    })
}

// None — запись в порядке.
fn check_entry(snapshot_dir: &Path, key: &str, expected: &str) -> Option<FailureKind> {
    let path = match key_to_path(snapshot_dir, key) {
        Some(p) => p,
        None => return Some(FailureKind::InvalidPath),
    };
    if !path.is_file() {
        return Some(FailureKind::Missing);
    }
    match sha256_file_hex(&path) {
        Ok(actual) if digest_eq(&actual, expected) => None,
        Ok(_) => Some(FailureKind::Mismatch),
        Err(e) => {
            debug!("verify: hash {} failed: {:#}", path.display(), e);
            Some(FailureKind::Unreadable)
        }
    }
}
