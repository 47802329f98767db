//! Writes `<file>.manifest.json` for a score CSV.
//!
//! Usage: dataset_manifest [path]   (defaults to $BENCH_DATA, then data.csv)

use benchboard::config::Config;
use benchboard::data::{default_manifest_path, load_table, DatasetManifest};
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let path = PathBuf::from(env::args().nth(1).unwrap_or_else(|| Config::from_env().data_path));

    let manifest = match load_table(&path).and_then(|table| DatasetManifest::build(&path, &table)) {
        Ok(m) => m,
        Err(err) => {
            eprintln!("load failed: {:#}", err);
            std::process::exit(1);
        }
    };

    for warning in &manifest.warnings {
        eprintln!("warning: {}", warning);
    }

    let out_path = default_manifest_path(&path);
    let written = serde_json::to_string_pretty(&manifest)
        .map_err(|e| e.to_string())
        .and_then(|body| fs::write(&out_path, body).map_err(|e| e.to_string()));
    if let Err(err) = written {
        eprintln!("failed to write {}: {}", out_path.display(), err);
        std::process::exit(2);
    }
    println!(
        "wrote manifest {} ({} rows, {} columns)",
        out_path.display(),
        manifest.row_count,
        manifest.column_count
    );
}
