use crate::minigo::MiniGo;
use gomodel_parser::{Builder, BuilderConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A throwaway source root. Packages are written below it by import path,
/// e.g. `example.com/shapes/point.go`.
pub struct GoFixture {
    dir: tempfile::TempDir,
}

impl Default for GoFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl GoFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        debug!("wrote fixture file {}", path.display());
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// A configuration searching only this root and resolving relative
    /// locations against it.
    pub fn config(&self) -> BuilderConfig {
        BuilderConfig {
            search_paths: vec![self.root().to_path_buf()],
            working_dir: Some(self.root().to_path_buf()),
            ..BuilderConfig::default()
        }
    }

    pub fn builder(&self) -> Builder<MiniGo> {
        self.builder_with(self.config())
    }

    pub fn builder_with(&self, config: BuilderConfig) -> Builder<MiniGo> {
        Builder::new(config, MiniGo)
    }
}
