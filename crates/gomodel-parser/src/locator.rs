//! Locating package directories and their source files
//!
//! [`SourceTree`] plays the role of a `go/build` context: it maps a location
//! (relative directory, absolute directory or import path) to the package's
//! directory, its import path and the files that take part in the build.

use crate::config::BuilderConfig;
use crate::constraint::file_constraint;
use crate::paths::to_slash;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// What a locator knows about one package directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPackage {
    /// Import path as located, not yet canonicalized.
    pub import_path: String,
    /// Absolute directory with symlinks resolved.
    pub dir: PathBuf,
    /// Non-test source file names, sorted.
    pub go_files: Vec<String>,
    /// `_test.go` file names, sorted.
    pub test_go_files: Vec<String>,
}

impl BuildPackage {
    pub fn has_source(&self) -> bool {
        !self.go_files.is_empty() || !self.test_go_files.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Cannot find package {location:?} in any of {searched:?}")]
    NotFound {
        location: String,
        searched: Vec<PathBuf>,
    },

    /// The directory exists but holds no buildable source. The located
    /// package is returned so callers can still use its directory.
    #[error("No buildable Go source files in {}", .0.dir.display())]
    NoSource(BuildPackage),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves locations to package directories.
pub trait PackageLocator {
    /// Locate the package at `location`, keeping only files whose build
    /// constraints are satisfied by `tags`.
    fn locate(&self, location: &str, tags: &BTreeSet<String>) -> Result<BuildPackage, LocateError>;
}

/// Filesystem locator backed by a list of source roots.
#[derive(Debug, Clone)]
pub struct SourceTree {
    search_paths: Vec<PathBuf>,
    working_dir: PathBuf,
}

impl SourceTree {
    pub fn new(search_paths: Vec<PathBuf>, working_dir: PathBuf) -> Self {
        Self {
            search_paths,
            working_dir,
        }
    }

    pub fn from_config(config: &BuilderConfig) -> Self {
        Self::new(config.search_paths.clone(), config.working_dir())
    }

    fn is_local(location: &str) -> bool {
        location == "."
            || location == ".."
            || location.starts_with("./")
            || location.starts_with("../")
            || Path::new(location).is_absolute()
    }

    /// Find the directory for `location` and the import path it is known by.
    fn resolve_dir(&self, location: &str) -> Result<(PathBuf, String), LocateError> {
        if Self::is_local(location) {
            let dir = clean(&self.working_dir.join(location));
            if !dir.is_dir() {
                return Err(LocateError::NotFound {
                    location: location.to_string(),
                    searched: vec![dir],
                });
            }
            let dir = real_path(&dir)?;
            let import_path = self
                .import_path_for(&dir)
                .unwrap_or_else(|| dir.to_string_lossy().into_owned());
            return Ok((dir, import_path));
        }

        for root in &self.search_paths {
            let candidate = root.join(location);
            if candidate.is_dir() {
                return Ok((real_path(&candidate)?, location.to_string()));
            }
        }
        Err(LocateError::NotFound {
            location: location.to_string(),
            searched: self.search_paths.clone(),
        })
    }

    /// Import path of `dir` relative to the first search root containing it.
    fn import_path_for(&self, dir: &Path) -> Option<String> {
        self.search_paths.iter().find_map(|root| {
            let root = fs::canonicalize(root).unwrap_or_else(|_| root.clone());
            dir.strip_prefix(&root)
                .ok()
                .map(to_slash)
                .filter(|rel| !rel.is_empty())
        })
    }
}

impl PackageLocator for SourceTree {
    fn locate(&self, location: &str, tags: &BTreeSet<String>) -> Result<BuildPackage, LocateError> {
        let (dir, import_path) = self.resolve_dir(location)?;
        debug!("located {} at {}", location, dir.display());

        let mut names: Vec<String> = fs::read_dir(&dir)
            .map_err(|source| LocateError::Io {
                path: dir.clone(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| name.ends_with(".go") && !name.starts_with('_') && !name.starts_with('.'))
            .collect();
        names.sort();

        let mut package = BuildPackage {
            import_path,
            dir,
            go_files: Vec::new(),
            test_go_files: Vec::new(),
        };
        for name in names {
            let path = package.dir.join(&name);
            let src = fs::read_to_string(&path).map_err(|source| LocateError::Io {
                path: path.clone(),
                source,
            })?;
            match file_constraint(&src) {
                Some(Ok(constraint)) if !constraint.eval(tags) => {
                    debug!("excluding {} by build constraint", path.display());
                    continue;
                }
                Some(Err(e)) => warn!("{}: {}", path.display(), e),
                _ => {}
            }
            if name.ends_with("_test.go") {
                package.test_go_files.push(name);
            } else {
                package.go_files.push(name);
            }
        }

        if package.has_source() {
            Ok(package)
        } else {
            Err(LocateError::NoSource(package))
        }
    }
}

fn real_path(dir: &Path) -> Result<PathBuf, LocateError> {
    fs::canonicalize(dir).map_err(|source| LocateError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Lexically normalize `.` and `..` components.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    fn no_tags() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn test_import_path_searches_roots_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write(&second.path().join("example.com/shapes"), "point.go", "package shapes\n");

        let tree = SourceTree::new(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            PathBuf::from("/"),
        );
        let pkg = tree.locate("example.com/shapes", &no_tags()).unwrap();
        assert_eq!(pkg.import_path, "example.com/shapes");
        assert_eq!(pkg.go_files, vec!["point.go".to_string()]);
        assert_eq!(
            pkg.dir,
            fs::canonicalize(second.path().join("example.com/shapes")).unwrap()
        );
    }

    #[test]
    fn test_relative_location_under_root_gets_import_path() {
        let root = tempfile::tempdir().unwrap();
        write(&root.path().join("example.com/app"), "main.go", "package app\n");
        let tree = SourceTree::new(vec![root.path().to_path_buf()], root.path().join("example.com"));
        let pkg = tree.locate("./app", &no_tags()).unwrap();
        assert_eq!(pkg.import_path, "example.com/app");
    }

    #[test]
    fn test_local_location_outside_roots_uses_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("pkg"), "a.go", "package pkg\n");
        let tree = SourceTree::new(Vec::new(), dir.path().to_path_buf());
        let pkg = tree.locate("./pkg", &no_tags()).unwrap();
        let real = fs::canonicalize(dir.path().join("pkg")).unwrap();
        assert_eq!(pkg.import_path, real.to_string_lossy());

        let again = tree.locate(&pkg.import_path, &no_tags()).unwrap();
        assert_eq!(again, pkg);
    }

    #[test]
    fn test_file_selection() {
        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = dir.path().join("p");
        write(&pkg_dir, "a.go", "package p\n");
        write(&pkg_dir, "a_test.go", "package p\n");
        write(&pkg_dir, "_ignored.go", "package p\n");
        write(&pkg_dir, "notes.txt", "hello\n");
        write(&pkg_dir, "tagged.go", "//go:build integration\n\npackage p\n");

        let tree = SourceTree::new(vec![dir.path().to_path_buf()], PathBuf::from("/"));
        let pkg = tree.locate("p", &no_tags()).unwrap();
        assert_eq!(pkg.go_files, vec!["a.go".to_string()]);
        assert_eq!(pkg.test_go_files, vec!["a_test.go".to_string()]);

        let tags: BTreeSet<String> = ["integration".to_string()].into_iter().collect();
        let pkg = tree.locate("p", &tags).unwrap();
        assert_eq!(pkg.go_files, vec!["a.go".to_string(), "tagged.go".to_string()]);
    }

    #[test]
    fn test_missing_and_empty_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        let tree = SourceTree::new(vec![dir.path().to_path_buf()], PathBuf::from("/"));

        assert!(matches!(
            tree.locate("missing", &no_tags()),
            Err(LocateError::NotFound { .. })
        ));
        match tree.locate("empty", &no_tags()) {
            Err(LocateError::NoSource(pkg)) => assert_eq!(pkg.import_path, "empty"),
            other => panic!("expected NoSource, got {other:?}"),
        }
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
    }
}
