// Базовые модули
pub mod consts;
pub mod config;
pub mod lock;

// Листья: хэш, пул ассетов, копия дерева, манифест
pub mod hash;
pub mod pool;
pub mod tree;
pub mod manifest;

// Снапшот и проверка
pub mod snapshot;
pub mod verify;

pub mod cli;

// Удобные реэкспорты
pub use config::{AppConfig, ConfigLoad};
pub use hash::{sha256_file_hex, sha256_hex};
pub use manifest::{read_manifest, write_manifest, Manifest};
pub use pool::{AssetPool, PoolAction};
pub use snapshot::{SnapshotBuilder, SnapshotReport};
pub use tree::{mirror_tree, TreeCopyStats};
pub use verify::{verify_snapshot, FailureKind, VerifyFailure, VerifyReport};
