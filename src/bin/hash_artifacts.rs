//! Writes `manifest.json` with SHA-256 digests of the three artifacts.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin hash_artifacts -- [artifact_dir]
//! ```
//!
//! The directory defaults to `TENSIO_ARTIFACT_DIR` (or `artifacts`). File
//! names follow the `TENSIO_*_FILE` variables.

use std::path::PathBuf;

use anyhow::{Context, Result};

use tensio::adapters::artifacts::ArtifactManifest;
use tensio::config::Config;

fn main() -> Result<()> {
    let config = Config::from_env()?;
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.artifacts.dir.clone());

    let manifest = ArtifactManifest::build(&dir, &config.artifacts.file_names())
        .with_context(|| format!("Failed to hash artifacts in {dir:?}"))?;
    let path = manifest.write(&dir)?;

    for (name, digest) in &manifest.files {
        println!("{digest}  {name}");
    }
    println!("Wrote {}", path.display());
    Ok(())
}
