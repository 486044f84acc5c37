use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Summary of one generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    /// Pool directory written by the run.
    pub pool_dir: PathBuf,
    /// Target package name, once resolved.
    pub package: Option<String>,
    /// Import set handed to the loader.
    pub imports: Vec<String>,
    /// Packages loaded by the tolerant pass, in load order.
    pub loaded_packages: Vec<String>,
    /// Models written to the pool, in merge order.
    pub models: Vec<String>,
    /// Files written by the synthesizer.
    pub files: Vec<PathBuf>,
    /// Diagnostics recorded by the tolerant pass.
    pub warnings: usize,
    /// Content digest of the pool after the run.
    pub digest: Option<String>,
}

impl RunReport {
    /// Persist report to a JSON file.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Deterministic digest of every file below `dir`.
///
/// Files are visited in path order; each contributes its relative path and
/// the blake3 hash of its bytes.
pub fn pool_digest(dir: &Path) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let bytes = std::fs::read(entry.path())?;
        hasher.update(relative.to_string_lossy().replace('\\', "/").as_bytes());
        hasher.update(b"\0");
        hasher.update(blake3::hash(&bytes).to_hex().as_bytes());
        hasher.update(b"\n");
    }
    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn report_roundtrip_save_and_load() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("out").join("report.json");

        let report = RunReport {
            pool_dir: PathBuf::from("/framework/pool"),
            package: Some("config".to_string()),
            imports: vec!["modules::base".to_string()],
            loaded_packages: vec!["pool".to_string(), "modules::base".to_string()],
            models: vec!["Partner".to_string()],
            files: vec![PathBuf::from("/framework/pool/partner.rs")],
            warnings: 2,
            digest: Some("abc".to_string()),
        };

        report.save_to_path(&file).expect("save report");
        let loaded = RunReport::load_from_path(&file).expect("load report");
        assert_eq!(loaded, report);
    }

    #[test]
    fn digest_tracks_names_and_contents() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.rs"), "pub struct A;").expect("write");
        std::fs::write(dir.path().join("b.rs"), "pub struct B;").expect("write");

        let first = pool_digest(dir.path()).expect("digest");
        assert_eq!(first, pool_digest(dir.path()).expect("digest"));

        std::fs::write(dir.path().join("b.rs"), "pub struct C;").expect("write");
        assert_ne!(first, pool_digest(dir.path()).expect("digest"));

        std::fs::rename(dir.path().join("b.rs"), dir.path().join("c.rs")).expect("rename");
        let renamed = pool_digest(dir.path()).expect("digest");
        assert_ne!(first, renamed);
    }
}
