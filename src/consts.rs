//! Общие константы раскладки снапшота, пула ассетов и конфигурации.

// -------- Snapshot layout --------
// <backup_root>/GD_<stamp>/{SteamFiles,SaveFiles,checksums.json}
pub const SNAPSHOT_PREFIX: &str = "GD_";
pub const SNAPSHOT_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const PROGRAM_FILES_DIR: &str = "SteamFiles";
pub const SAVE_FILES_DIR: &str = "SaveFiles";
pub const MANIFEST_FILE: &str = "checksums.json";

// -------- Asset pool --------
// Общий для всех снапшотов: <backup_root>/Assets/SaveAssets
pub const ASSET_POOL_DIR: &str = "Assets";
pub const ASSET_POOL_SUBDIR: &str = "SaveAssets";

// -------- Classification --------
// Расширение "progress"-файлов (сравнение без учёта регистра).
pub const PROGRESS_EXT: &str = "dat";

// -------- Config --------
pub const CONFIG_FILE: &str = "appsettings.json";
pub const CONFIG_ENV: &str = "SAVESNAP_CONFIG";

// -------- Locking --------
pub const RUN_LOCK_FILE: &str = ".savesnap.lock";

// -------- IO --------
pub const HASH_BUF_SIZE: usize = 64 * 1024;
