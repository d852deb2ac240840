//! Canonical identities for every node in a [`Universe`](crate::Universe)

use serde::{Deserialize, Serialize};
use std::fmt;

/// A type name with an optional package qualifier.
///
/// Builtins and anonymous composites (`*pkg.Foo`, `map[string]int`,
/// `struct{N int}`) live in the pseudo-package with an empty path; their
/// `name` is the full structural description.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Name {
    /// Canonical package path, empty for builtins and anonymous types.
    pub package: String,
    /// Local name within the package.
    pub name: String,
    /// Location of the definition, for sources whose package path and
    /// directory differ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Name {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            path: None,
        }
    }

    /// A name in the builtin pseudo-package.
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::new("", name)
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn is_builtin_package(&self) -> bool {
        self.package.is_empty()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}
