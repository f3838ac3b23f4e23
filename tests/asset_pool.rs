// tests/asset_pool.rs
//
// Дедупликация пула ассетов по размеру:
// - новый файл — Added;
// - тот же размер — Skipped (даже если содержимое другое: эвристика по длине);
// - другой размер — Overwritten.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use savesnap::{AppConfig, AssetPool, PoolAction, SnapshotBuilder};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("savesnap-test-pool-{prefix}-{pid}-{t}-{id}"))
}

#[test]
fn pool_sync_added_skipped_overwritten() -> Result<()> {
    let root = unique_root("sync");
    let src_dir = root.join("src");
    fs::create_dir_all(src_dir.join("gfx"))?;
    let src = src_dir.join("gfx").join("bg.png");
    let rel = Path::new("gfx").join("bg.png");

    let pool = AssetPool::open_or_create(&root.join("pool"))?;
    assert!(pool.dir_path().is_dir());

    fs::write(&src, b"XYZ")?;
    assert_eq!(pool.sync(&src, &rel)?, PoolAction::Added);
    assert_eq!(fs::read(pool.entry_path(&rel))?, b"XYZ");

    assert_eq!(pool.sync(&src, &rel)?, PoolAction::Skipped);

    // та же длина, другое содержимое — пул НЕ обновляется
    fs::write(&src, b"QQQ")?;
    assert_eq!(pool.sync(&src, &rel)?, PoolAction::Skipped);
    assert_eq!(fs::read(pool.entry_path(&rel))?, b"XYZ");

    fs::write(&src, b"XYZ12")?;
    assert_eq!(pool.sync(&src, &rel)?, PoolAction::Overwritten);
    assert_eq!(fs::read(pool.entry_path(&rel))?, b"XYZ12");
    Ok(())
}

#[test]
fn pool_sync_missing_source_is_error() -> Result<()> {
    let root = unique_root("nosrc");
    let pool = AssetPool::open_or_create(&root.join("pool"))?;
    assert!(pool
        .sync(&root.join("missing.png"), Path::new("missing.png"))
        .is_err());
    Ok(())
}

#[test]
fn snapshot_runs_update_pool_only_on_size_change() -> Result<()> {
    let root = unique_root("runs");
    let save = root.join("save");
    let program = root.join("program");
    fs::create_dir_all(&save)?;
    fs::create_dir_all(&program)?;
    fs::write(save.join("progress.dat"), b"AAAA")?;
    fs::write(save.join("bg.png"), b"XYZ")?;

    let cfg = AppConfig::platform_defaults()
        .with_save_dir(&save)
        .with_assets_dir(&program)
        .with_backup_root(root.join("backup"));
    let b = SnapshotBuilder::new(&cfg);

    let r1 = b.run_at("20240101_000001")?;
    assert_eq!(r1.assets_added, 1);

    // размер изменился: 3 -> 5 байт
    fs::write(save.join("bg.png"), b"XYZ12")?;
    let r2 = b.run_at("20240101_000002")?;
    assert_eq!(r2.assets_overwritten, 1);
    assert_eq!(fs::read(r2.pool_dir.join("bg.png"))?, b"XYZ12");

    // размер тот же, содержимое другое — известная слепая зона
    fs::write(save.join("bg.png"), b"ABCDE")?;
    let r3 = b.run_at("20240101_000003")?;
    assert_eq!(r3.assets_skipped, 1);
    assert_eq!(r3.assets_overwritten, 0);
    assert_eq!(fs::read(r3.pool_dir.join("bg.png"))?, b"XYZ12");
    Ok(())
}
