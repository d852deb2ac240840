//! Canonical import paths

use std::borrow::Borrow;
use std::fmt;
use std::path::{Component, Path};

const VENDOR_SEGMENT: &str = "/vendor/";

/// Directory names holding version-control metadata, never packages.
const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn", ".bzr"];

/// An import path that has been canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportPath(String);

impl ImportPath {
    /// Canonicalize `import_path`: a path with a vendoring segment is
    /// rewritten to the suffix after it. Only one level is supported.
    pub fn canonicalize(import_path: &str) -> Self {
        match import_path.find(VENDOR_SEGMENT) {
            Some(idx) => Self(import_path[idx + VENDOR_SEGMENT.len()..].to_string()),
            None => Self(import_path.to_string()),
        }
    }

    /// Wrap a path as-is, for names the caller has not resolved yet.
    pub fn raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a slash-separated relative path.
    pub fn join(&self, rel: &str) -> Self {
        let rel = rel.trim_matches('/');
        if rel.is_empty() {
            self.clone()
        } else if self.0.is_empty() {
            Self(rel.to_string())
        } else {
            Self(format!("{}/{}", self.0.trim_end_matches('/'), rel))
        }
    }
}

impl fmt::Display for ImportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImportPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ImportPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// True if any component of `path` is a version-control metadata directory.
pub fn is_in_vcs_dir(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| VCS_DIRS.contains(&n)),
        _ => false,
    })
}

/// Render a relative filesystem path with forward slashes.
pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_vendor_segment_is_stripped() {
        assert_eq!(
            ImportPath::canonicalize("example.com/app/vendor/github.com/lib/x").as_str(),
            "github.com/lib/x"
        );
        assert_eq!(
            ImportPath::canonicalize("example.com/app/x").as_str(),
            "example.com/app/x"
        );
        // A leading "vendor/" is not a vendoring segment.
        assert_eq!(ImportPath::canonicalize("vendor/x").as_str(), "vendor/x");
    }

    #[test]
    fn test_join() {
        let base = ImportPath::raw("example.com/app");
        assert_eq!(base.join("a/b").as_str(), "example.com/app/a/b");
        assert_eq!(base.join("/a/").as_str(), "example.com/app/a");
        assert_eq!(base.join("").as_str(), "example.com/app");
    }

    #[test]
    fn test_vcs_dirs() {
        assert!(is_in_vcs_dir(Path::new("/src/app/.git/objects")));
        assert!(is_in_vcs_dir(Path::new(".hg")));
        assert!(!is_in_vcs_dir(Path::new("/src/app/gitlab")));
    }

    proptest! {
        #[test]
        fn prop_paths_without_vendor_unchanged(path in "[a-z]{1,6}(/[a-z.]{1,6}){0,4}") {
            prop_assume!(!path.contains("/vendor/"));
            let canonical = ImportPath::canonicalize(&path);
            prop_assert_eq!(canonical.as_str(), path.as_str());
        }

        #[test]
        fn prop_single_vendor_segment_yields_suffix(
            prefix in "[a-z]{1,6}(/[a-z]{1,6}){0,2}",
            suffix in "[a-z]{1,6}(/[a-z]{1,6}){0,2}",
        ) {
            prop_assume!(!prefix.split('/').any(|s| s == "vendor"));
            let vendored = format!("{prefix}/vendor/{suffix}");
            let canonical = ImportPath::canonicalize(&vendored);
            prop_assert_eq!(canonical.as_str(), suffix.as_str());
        }
    }
}
