//! Artifact manifest: SHA-256 digests binding the files of one export.
//!
//! The manifest is written next to the artifacts by the `hash_artifacts`
//! binary. When present, every file it lists must match before anything is
//! deserialized.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ArtifactError;

/// File name of the manifest inside the artifact directory.
pub const MANIFEST_FILE: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    /// Unix timestamp (seconds) of the export.
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Relative file name → lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Whole seconds since the Unix epoch; `None` before the epoch or past `i64`.
fn unix_seconds(time: SystemTime) -> Option<i64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn check_relative(name: &str) -> Result<(), ArtifactError> {
    let path = Path::new(name);
    if name.is_empty()
        || path.is_absolute()
        || path
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
    {
        return Err(ArtifactError::Integrity(format!(
            "manifest entry {name:?} must be a plain relative path"
        )));
    }
    Ok(())
}

impl ArtifactManifest {
    /// Hash `files` inside `dir` into a new manifest.
    ///
    /// # Errors
    /// Returns `ArtifactError::Io` if a file cannot be read.
    pub fn build(dir: &Path, files: &[&str]) -> Result<Self, ArtifactError> {
        let mut map = BTreeMap::new();
        for name in files {
            check_relative(name)?;
            let bytes = read_file(&dir.join(name))?;
            map.insert((*name).to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            created_at: unix_seconds(SystemTime::now()),
            files: map,
        })
    }

    /// Write the manifest to `dir/manifest.json`.
    ///
    /// # Errors
    /// Returns `ArtifactError::Io` if the file cannot be written.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ArtifactError> {
        let path = dir.join(MANIFEST_FILE);
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| ArtifactError::Invalid(format!("cannot serialize manifest: {e}")))?;
        fs::write(&path, bytes).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Read `dir/manifest.json`, if there is one.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read(dir: &Path) -> Result<Option<Self>, ArtifactError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = read_file(&path)?;
        let manifest: Self = serde_json::from_slice(&bytes).map_err(|e| {
            ArtifactError::Integrity(format!("invalid {MANIFEST_FILE} format: {e}"))
        })?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ArtifactError::Integrity(format!(
                "unsupported manifest version: {}",
                manifest.version
            )));
        }
        Ok(Some(manifest))
    }

    /// Check that every `required` file is listed and that every listed file
    /// matches its digest.
    ///
    /// # Errors
    /// Returns `ArtifactError::Integrity` on the first missing entry or
    /// mismatching digest.
    pub fn verify(&self, dir: &Path, required: &[&str]) -> Result<(), ArtifactError> {
        for name in required {
            if !self.files.contains_key(*name) {
                return Err(ArtifactError::Integrity(format!(
                    "{MANIFEST_FILE} does not bind {name}"
                )));
            }
        }

        for (name, expected) in &self.files {
            check_relative(name)?;
            let bytes = read_file(&dir.join(name))?;
            let actual = sha256_hex(&bytes);
            if !constant_time_eq_str(&actual, &expected.to_ascii_lowercase()) {
                return Err(ArtifactError::Integrity(format!(
                    "hash mismatch for {name}"
                )));
            }
        }
        Ok(())
    }
}
