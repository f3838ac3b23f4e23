use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::{default_config_path, AppConfig, ConfigLoad};
use crate::snapshot::{SnapshotBuilder, SnapshotReport};
use crate::verify::{verify_snapshot, VerifyReport};

#[derive(Parser, Debug)]
#[command(
    name = "savesnap",
    version,
    about = "Snapshot game program files and saves; verify saved progress files"
)]
pub struct Cli {
    /// Verify an existing snapshot folder against its checksums.json (no snapshot is taken)
    #[arg(long, value_name = "FOLDER")]
    pub verify: Option<PathBuf>,

    /// Config file (default: $SAVESNAP_CONFIG or appsettings.json next to the executable)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the verification report as JSON (with --verify)
    #[arg(long, requires = "verify")]
    pub json: bool,

    /// Skip re-verifying the new snapshot after it is written
    #[arg(long, conflicts_with = "verify")]
    pub no_verify: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Режим только проверки: конфиг не нужен.
    if let Some(dir) = cli.verify {
        return cmd_verify(&dir, cli.json);
    }

    let cfg_path = cli.config.unwrap_or_else(default_config_path);
    cmd_snapshot(&cfg_path, !cli.no_verify)
}

/// Снапшот по конфигу. Если конфига не было — пишем дефолтный и выходим успешно.
pub fn cmd_snapshot(cfg_path: &Path, verify_after: bool) -> Result<()> {
    let cfg = match AppConfig::load(cfg_path)? {
        ConfigLoad::Loaded(cfg) => cfg,
        ConfigLoad::Bootstrapped(path) => {
            println!(
                "Created {} - please review paths, then run again.",
                path.display()
            );
            return Ok(());
        }
    };

    let report = SnapshotBuilder::new(&cfg).run()?;
    print_snapshot_report(&report);

    if verify_after {
        let v = verify_snapshot(&report.snapshot_dir)?;
        print_verify_report(&v);
    }
    Ok(())
}

/// Проверка снапшота. Найденные проблемы — не ошибка процесса, только отчёт.
pub fn cmd_verify(dir: &Path, json: bool) -> Result<()> {
    let report = verify_snapshot(dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_verify_report(&report);
    }
    Ok(())
}

fn print_snapshot_report(r: &SnapshotReport) {
    println!("Snapshot finished");
    println!(
        "  Program files : {} file(s), {} B copied to {}",
        r.program_files,
        r.program_bytes,
        r.snapshot_dir.join(crate::consts::PROGRAM_FILES_DIR).display()
    );
    println!("  Progress files: {} checksummed", r.progress_files);
    println!(
        "  Media assets  : {} added, {} updated, {} unchanged under {}",
        r.assets_added,
        r.assets_overwritten,
        r.assets_skipped,
        r.pool_dir.display()
    );
    println!("  Snapshot root : {}", r.snapshot_dir.display());
}

fn print_verify_report(r: &VerifyReport) {
    match r {
        VerifyReport::NoManifest => println!("No checksums.json found."),
        VerifyReport::Checked { checked, failures } if failures.is_empty() => {
            println!("All {} progress file(s) verified OK.", checked)
        }
        VerifyReport::Checked { failures, .. } => {
            println!("{} corrupted:", failures.len());
            for f in failures {
                println!("  - {}", f.path);
            }
        }
    }
}
