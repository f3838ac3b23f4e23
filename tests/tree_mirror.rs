use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use savesnap::mirror_tree;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("savesnap-test-tree-{prefix}-{pid}-{t}-{id}"))
}

#[test]
fn mirrors_files_and_empty_dirs() -> Result<()> {
    let root = unique_root("mirror");
    let src = root.join("src");
    fs::create_dir_all(src.join("Resources").join("sfx"))?;
    fs::create_dir_all(src.join("empty"))?;
    fs::write(src.join("Game.exe"), b"exe")?;
    fs::write(src.join("Resources").join("sfx").join("a.ogg"), b"ogg!")?;

    let dst = root.join("dst");
    let stats = mirror_tree(&src, &dst)?;
    assert_eq!(stats.files, 2);
    assert_eq!(stats.dirs, 3); // Resources, Resources/sfx, empty
    assert_eq!(stats.bytes, 7);

    assert!(dst.join("empty").is_dir());
    assert_eq!(fs::read(dst.join("Game.exe"))?, b"exe");
    assert_eq!(fs::read(dst.join("Resources").join("sfx").join("a.ogg"))?, b"ogg!");
    Ok(())
}

#[test]
fn mirror_overwrites_existing_files() -> Result<()> {
    let root = unique_root("overwrite");
    let src = root.join("src");
    let dst = root.join("dst");
    fs::create_dir_all(&src)?;
    fs::create_dir_all(&dst)?;
    fs::write(src.join("a.txt"), b"new")?;
    fs::write(dst.join("a.txt"), b"old-and-longer")?;

    mirror_tree(&src, &dst)?;
    assert_eq!(fs::read(dst.join("a.txt"))?, b"new");
    Ok(())
}

#[test]
fn mirror_of_missing_source_fails() {
    let root = unique_root("missing");
    assert!(mirror_tree(&root.join("nope"), &root.join("dst")).is_err());
}
