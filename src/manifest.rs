//! manifest — checksums.json одного снапшота.
//!
//! Формат: JSON-объект (pretty) "относительный путь" -> "SHA-256 uppercase hex":
//!
//! {
//!   "SaveFiles/CCGameManager.dat": "3F0A...",
//!   "SaveFiles/levels/CCLocalLevels.dat": "9B11..."
//! }
//!
//! Правила:
//! - ключи пишутся через '/' на любой платформе; ключ без единого '/' читается
//!   с разделителем '\' (манифесты, записанные под Windows старыми инструментами);
//! - ключи отсортированы (BTreeMap) — детерминированный и читаемый вывод;
//! - манифест пишется ровно один раз в конце снапшота (tmp + rename) и больше
//!   не изменяется: повторная запись в тот же снапшот — ошибка.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use crate::consts::MANIFEST_FILE;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавить (или заменить) запись rel_key -> digest.
    pub fn insert(&mut self, rel_key: String, digest_hex: String) {
        self.entries.insert(rel_key, digest_hex);
    }

    pub fn get(&self, rel_key: &str) -> Option<&str> {
        self.entries.get(rel_key).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// --------- Paths/IO ----------

/// Путь к манифесту снапшота (<snapshot>/checksums.json).
pub fn manifest_path(snapshot_dir: &Path) -> PathBuf {
    snapshot_dir.join(MANIFEST_FILE)
}

/// Записать манифест (pretty JSON). Уже существующий манифест не перезаписывается.
pub fn write_manifest(snapshot_dir: &Path, m: &Manifest) -> Result<PathBuf> {
    let path = manifest_path(snapshot_dir);
    if path.exists() {
        return Err(anyhow!(
            "manifest {} already exists; snapshots are write-once",
            path.display()
        ));
    }
    let tmp = path.with_extension("tmp");

    let json = serde_json::to_string_pretty(m).context("serialize manifest")?;
    {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .with_context(|| format!("open tmp manifest {}", tmp.display()))?;
        f.write_all(json.as_bytes())?;
        f.flush()?;
        f.sync_all()
            .with_context(|| format!("fsync {}", tmp.display()))?;
    }
    fs::rename(&tmp, &path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(path)
}

/// Прочитать манифест снапшота. Ok(None) — файла нет (старый снапшот без манифеста).
/// Битый JSON — ошибка.
pub fn read_manifest(snapshot_dir: &Path) -> Result<Option<Manifest>> {
    let path = manifest_path(snapshot_dir);
    let text = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read manifest {}", path.display())),
    };
    let m: Manifest = serde_json::from_str(&text)
        .with_context(|| format!("parse manifest json {}", path.display()))?;
    Ok(Some(m))
}

// --------- Keys ----------

/// Ключ манифеста из относительного пути: компоненты через '/'.
/// Имена должны быть валидным UTF-8 (JSON-ключ).
pub fn rel_key(rel: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for c in rel.components() {
        match c {
            Component::Normal(s) => {
                let s = s
                    .to_str()
                    .ok_or_else(|| anyhow!("non UTF-8 path component in {}", rel.display()))?;
                parts.push(s);
            }
            Component::CurDir => {}
            _ => return Err(anyhow!("path {} is not a plain relative path", rel.display())),
        }
    }
    if parts.is_empty() {
        return Err(anyhow!("empty relative path"));
    }
    Ok(parts.join("/"))
}

/// Обратное преобразование ключа в путь внутри снапшота.
/// '\' считается разделителем только в ключах без '/' (манифесты, записанные
/// под Windows); иначе это часть имени файла. None — ключ пуст или выходит за
/// пределы снапшота (корень, "..", префикс диска).
pub fn key_to_path(snapshot_dir: &Path, key: &str) -> Option<PathBuf> {
    if key.starts_with('/') || key.starts_with('\\') {
        return None;
    }
    let sep = if key.contains('/') { '/' } else { '\\' };
    let mut out = snapshot_dir.to_path_buf();
    let mut any = false;
    for part in key.split(sep).filter(|p| !p.is_empty()) {
        for c in Path::new(part).components() {
            match c {
                Component::Normal(s) => {
                    out.push(s);
                    any = true;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
    }
    any.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rel_key_uses_forward_slashes() {
        let p = Path::new("SaveFiles").join("levels").join("a.dat");
        assert_eq!(rel_key(&p).unwrap(), "SaveFiles/levels/a.dat");
    }

    #[test]
    fn rel_key_rejects_parent_dirs() {
        assert!(rel_key(Path::new("../x.dat")).is_err());
        assert!(rel_key(Path::new("")).is_err());
    }

    #[test]
    fn key_to_path_accepts_both_separators() {
        let root = Path::new("snap");
        let a = key_to_path(root, "SaveFiles/x/a.dat").unwrap();
        let b = key_to_path(root, "SaveFiles\\x\\a.dat").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, root.join("SaveFiles").join("x").join("a.dat"));
    }

    #[test]
    fn key_to_path_rejects_escapes() {
        let root = Path::new("snap");
        assert!(key_to_path(root, "../outside.dat").is_none());
        assert!(key_to_path(root, "..\\outside.dat").is_none());
        assert!(key_to_path(root, "SaveFiles/../../outside.dat").is_none());
        assert!(key_to_path(root, "/etc/passwd").is_none());
        assert!(key_to_path(root, "").is_none());
        assert!(key_to_path(root, "//").is_none());
    }

    #[cfg(windows)]
    #[test]
    fn key_to_path_rejects_drive_prefix() {
        assert!(key_to_path(Path::new("snap"), "C:\\x.dat").is_none());
        assert!(key_to_path(Path::new("snap"), "SaveFiles/C:x.dat").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn key_to_path_inverts_rel_key_for_unusual_names() {
        let root = Path::new("snap");
        for name in ["level:1.dat", "a\\b.dat"] {
            let rel = Path::new("SaveFiles").join(name);
            let key = rel_key(&rel).unwrap();
            assert_eq!(key_to_path(root, &key).unwrap(), root.join(&rel));
        }
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut m = Manifest::new();
        m.insert("SaveFiles/b.dat".into(), "BB".into());
        m.insert("SaveFiles/a.dat".into(), "AA".into());
        let v: serde_json::Value = serde_json::to_value(&m).unwrap();
        assert_eq!(v["SaveFiles/a.dat"], "AA");
        assert_eq!(v.as_object().unwrap().len(), 2);
        let back: Manifest = serde_json::from_value(v).unwrap();
        assert_eq!(back, m);
    }
}
