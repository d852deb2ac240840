use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Package not found: {path}: {reason}")]
    PackageNotFound { path: String, reason: String },

    #[error("Circular dependency for {0:?}")]
    CircularDependency(String),

    #[error("Parse error in {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    #[error("Filesystem error at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Package {package:?} ({}) previously resolved to {}", dir.display(), previous.display())]
    DuplicateResolution {
        package: String,
        dir: PathBuf,
        previous: PathBuf,
    },

    #[error("No buildable source in {0:?}")]
    NoSource(String),

    #[error("No files for package {0:?}")]
    NoFiles(String),

    #[error("Package is not known: {0:?}")]
    UnknownPackage(String),

    #[error("Type checking {package:?} failed: {message}")]
    TypeCheck { package: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl ParserError {
    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Errors that mean the package simply does not exist. These are
    /// swallowed for packages that were only pulled in by an import.
    pub fn is_package_not_found(&self) -> bool {
        matches!(self, Self::PackageNotFound { .. })
    }

    /// Errors that can be absorbed when they happen on a transitively
    /// imported package.
    pub fn is_recoverable_when_transitive(&self) -> bool {
        matches!(
            self,
            Self::PackageNotFound { .. }
                | Self::Parse { .. }
                | Self::NoSource(_)
                | Self::NoFiles(_)
                | Self::TypeCheck { .. }
        )
    }
}
