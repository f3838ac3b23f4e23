//! Configuration for savesnap (appsettings.json).
//!
//! Goals:
//! - One small JSON file with three paths: save dir, program-files dir, backup root.
//! - Missing file is not an error: defaults are written and the caller is told to
//!   stop (ConfigLoad::Bootstrapped) so the operator can review the paths.
//! - Malformed file is an error.
//!
//! File location:
//! - ENV SAVESNAP_CONFIG (if set and non-empty) or `--config <path>`;
//! - otherwise `appsettings.json` next to the executable.
//!
//! JSON keys are PascalCase for compatibility with existing settings files:
//! {
//!   "SaveDir": "...",
//!   "AssetsDir": "...",
//!   "BackupRoot": "..."
//! }

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::consts::{CONFIG_ENV, CONFIG_FILE};

/// Paths used by one run. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppConfig {
    /// Game save directory (progress files + media assets).
    pub save_dir: PathBuf,

    /// Game program-files directory, copied in full on every run.
    pub assets_dir: PathBuf,

    /// Root for snapshots (GD_<stamp>/) and the shared asset pool (Assets/SaveAssets).
    pub backup_root: PathBuf,
}

/// Result of loading the config file.
#[derive(Debug)]
pub enum ConfigLoad {
    /// Config read and parsed.
    Loaded(AppConfig),
    /// No config existed; defaults were written to this path. The run should stop.
    Bootstrapped(PathBuf),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::platform_defaults()
    }
}

impl AppConfig {
    /// Platform-specific default paths.
    #[cfg(windows)]
    pub fn platform_defaults() -> Self {
        let local = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(r"C:\"));
        let docs = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from(r"C:\"));
        Self {
            save_dir: local.join("GeometryDash"),
            assets_dir: PathBuf::from(
                r"C:\Program Files (x86)\Steam\steamapps\common\Geometry Dash",
            ),
            backup_root: docs.join("GD_Backups"),
        }
    }

    /// Platform-specific default paths.
    #[cfg(not(windows))]
    pub fn platform_defaults() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let local = dirs::data_local_dir().unwrap_or_else(|| home.join(".local/share"));
        let docs = dirs::document_dir().unwrap_or_else(|| home.clone());
        Self {
            save_dir: local.join("GeometryDash"),
            assets_dir: home
                .join(".steam/steam/steamapps/common")
                .join("Geometry Dash"),
            backup_root: docs.join("GD_Backups"),
        }
    }

    /// Load config from `path`; write defaults and report Bootstrapped if it is missing.
    pub fn load(path: &Path) -> Result<ConfigLoad> {
        let text = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Self::platform_defaults().save(path)?;
                info!("config: created {} with default paths", path.display());
                return Ok(ConfigLoad::Bootstrapped(path.to_path_buf()));
            }
            Err(e) => return Err(e).with_context(|| format!("read config {}", path.display())),
        };
        let cfg: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(ConfigLoad::Loaded(cfg))
    }

    /// Write this config as pretty JSON (tmp + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config dir {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp)
                .with_context(|| format!("open tmp config {}", tmp.display()))?;
            f.write_all(json.as_bytes())?;
            f.flush()?;
        }
        fs::rename(&tmp, path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
        Ok(())
    }

    // Fluent setters (builder-style), handy for tests and embedding.

    pub fn with_save_dir<P: Into<PathBuf>>(mut self, p: P) -> Self {
        self.save_dir = p.into();
        self
    }

    pub fn with_assets_dir<P: Into<PathBuf>>(mut self, p: P) -> Self {
        self.assets_dir = p.into();
        self
    }

    pub fn with_backup_root<P: Into<PathBuf>>(mut self, p: P) -> Self {
        self.backup_root = p.into();
        self
    }
}

impl fmt::Display for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AppConfig {{ save_dir: {}, assets_dir: {}, backup_root: {} }}",
            self.save_dir.display(),
            self.assets_dir.display(),
            self.backup_root.display(),
        )
    }
}

/// Default config path: ENV SAVESNAP_CONFIG, else `appsettings.json` next to the executable.
/// Falls back to the working directory if the executable path is unknown.
pub fn default_config_path() -> PathBuf {
    if let Ok(v) = std::env::var(CONFIG_ENV) {
        let s = v.trim();
        if !s.is_empty() {
            return PathBuf::from(s);
        }
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.join(CONFIG_FILE)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}
