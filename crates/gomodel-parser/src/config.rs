//! Builder configuration

use crate::error::ParserError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Options controlling which packages and files a [`Builder`](crate::Builder)
/// sees.
///
/// ```toml
/// build_tags = ["integration"]
/// include_test_files = false
/// search_paths = ["/home/me/go/src"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Tags satisfied when evaluating `//go:build` constraints.
    pub build_tags: Vec<String>,

    /// Include `_test.go` files in each package.
    pub include_test_files: bool,

    /// Source roots searched, in order, for import paths.
    pub search_paths: Vec<PathBuf>,

    /// Base for relative locations. Defaults to the process working
    /// directory.
    pub working_dir: Option<PathBuf>,
}

impl BuilderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ParserError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ParserError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ParserError::file_system(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Append `$GOPATH/*/src` and `$GOROOT/src` to the search paths when the
    /// variables are set.
    pub fn with_go_env(mut self) -> Self {
        if let Some(gopath) = std::env::var_os("GOPATH") {
            for entry in std::env::split_paths(&gopath) {
                if !entry.as_os_str().is_empty() {
                    self.search_paths.push(entry.join("src"));
                }
            }
        }
        if let Some(goroot) = std::env::var_os("GOROOT") {
            self.search_paths.push(PathBuf::from(goroot).join("src"));
        }
        debug!("search paths: {:?}", self.search_paths);
        self
    }

    pub fn with_build_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn with_test_files(mut self, include: bool) -> Self {
        self.include_test_files = include;
        self
    }

    /// The effective base for relative locations.
    pub fn working_dir(&self) -> PathBuf {
        self.working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let config = BuilderConfig::from_toml_str(
            r#"
build_tags = ["integration", "linux"]
include_test_files = true
search_paths = ["/src/a", "/src/b"]
"#,
        )
        .unwrap();
        assert_eq!(config.build_tags, vec!["integration", "linux"]);
        assert!(config.include_test_files);
        assert_eq!(config.search_paths.len(), 2);
        assert_eq!(config.working_dir, None);
    }

    #[test]
    fn test_missing_fields_default() {
        let config = BuilderConfig::from_toml_str("").unwrap();
        assert_eq!(config, BuilderConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = BuilderConfig::from_toml_str("build_tags = 3").unwrap_err();
        assert!(matches!(err, ParserError::Config(_)));
    }

    #[test]
    fn test_builder_methods() {
        let config = BuilderConfig::default()
            .with_build_tags(["a"])
            .with_search_path("/src")
            .with_test_files(true);
        assert_eq!(config.build_tags, vec!["a"]);
        assert_eq!(config.search_paths, vec![PathBuf::from("/src")]);
        assert!(config.include_test_files);
    }
}
