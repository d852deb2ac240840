//! Type-check coordination
//!
//! Before a package is checked its imports are loaded and checked through
//! the same path, so the oracle only ever sees finished dependencies. A
//! package is marked in progress before any of that starts; running into
//! the mark again means the import graph has a cycle.

use crate::builder::Builder;
use crate::error::ParserError;
use crate::oracle::{CheckedPackage, Frontend, ImportedPackages, NamedType, OracleError};
use crate::paths::ImportPath;
use crate::walker::NamedLookup;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument, warn};

#[derive(Debug)]
pub(crate) enum CheckState {
    InProgress,
    Done(CheckedPackage),
    /// The oracle failed but handed back what it resolved.
    Partial {
        checked: CheckedPackage,
        message: String,
    },
    Failed(String),
}

/// Type-check results of one run, plus the predeclared named types.
#[derive(Debug, Default)]
pub(crate) struct CheckCache {
    states: HashMap<ImportPath, CheckState>,
    predeclared: HashMap<String, NamedType>,
}

impl CheckCache {
    pub fn new(predeclared: Vec<NamedType>) -> Self {
        Self {
            states: HashMap::new(),
            predeclared: predeclared
                .into_iter()
                .map(|def| (def.name.clone(), def))
                .collect(),
        }
    }

    fn state(&self, package: &ImportPath) -> Option<&CheckState> {
        self.states.get(package)
    }

    /// The checked package, complete or partial.
    pub fn checked(&self, package: &str) -> Option<&CheckedPackage> {
        match self.states.get(package)? {
            CheckState::Done(checked) | CheckState::Partial { checked, .. } => Some(checked),
            CheckState::InProgress | CheckState::Failed(_) => None,
        }
    }

    fn set(&mut self, package: &ImportPath, state: CheckState) {
        self.states.insert(package.clone(), state);
    }
}

impl NamedLookup for CheckCache {
    fn named(&self, package: &str, name: &str) -> Option<&NamedType> {
        if package.is_empty() {
            return self.predeclared.get(name);
        }
        self.checked(package)?.named.get(name)
    }
}

/// What the oracle may see while checking one package: its imports, by the
/// literal used in source.
struct ImportView<'a> {
    resolved: &'a BTreeMap<String, ImportPath>,
    checks: &'a CheckCache,
}

impl ImportedPackages for ImportView<'_> {
    fn get(&self, import: &str) -> Option<&CheckedPackage> {
        let package = self.resolved.get(import)?;
        self.checks.checked(package.as_str())
    }
}

impl<F: Frontend> Builder<F> {
    /// Type check a loaded package, checking its imports first. Completed
    /// results are cached; failures are reported again on every call.
    #[instrument(skip(self), level = "debug")]
    pub(crate) fn type_check_package(&mut self, package: &ImportPath) -> Result<(), ParserError> {
        match self.checks.state(package) {
            Some(CheckState::Done(_)) => {
                debug!("{} already checked", package);
                return Ok(());
            }
            Some(CheckState::InProgress) => {
                return Err(ParserError::CircularDependency(package.to_string()));
            }
            Some(CheckState::Partial { message, .. }) | Some(CheckState::Failed(message)) => {
                return Err(ParserError::TypeCheck {
                    package: package.to_string(),
                    message: message.clone(),
                });
            }
            None => {}
        }
        if !self.sources.has_package(package) {
            return Err(ParserError::NoFiles(package.to_string()));
        }

        self.checks.set(package, CheckState::InProgress);

        let mut resolved = BTreeMap::new();
        for import in self.sources.imports(package) {
            if import == package.as_str() {
                continue;
            }
            match self.import_package(&import, false) {
                Ok(Some(path)) => {
                    resolved.insert(import, path);
                }
                Ok(None) => {}
                Err(e) => {
                    self.checks.set(package, CheckState::Failed(e.to_string()));
                    return Err(e);
                }
            }
        }

        let view = ImportView {
            resolved: &resolved,
            checks: &self.checks,
        };
        let result = self
            .frontend
            .check_package(package.as_str(), self.sources.files(package), &view);

        match result {
            Ok(checked) => {
                for diagnostic in &checked.diagnostics {
                    debug!("type checker: {}", diagnostic);
                }
                self.checks.set(package, CheckState::Done(checked));
                Ok(())
            }
            Err(OracleError::Check {
                message,
                partial: Some(partial),
            }) => {
                warn!("type checking {} reported errors: {}", package, message);
                self.checks.set(
                    package,
                    CheckState::Partial {
                        checked: *partial,
                        message: message.clone(),
                    },
                );
                Err(ParserError::TypeCheck {
                    package: package.to_string(),
                    message,
                })
            }
            Err(OracleError::Check {
                message,
                partial: None,
            }) => {
                self.checks.set(package, CheckState::Failed(message.clone()));
                Err(ParserError::TypeCheck {
                    package: package.to_string(),
                    message,
                })
            }
            Err(OracleError::PackageNotFound(path)) => {
                let reason = "unknown to the type checker".to_string();
                self.checks.set(package, CheckState::Failed(reason.clone()));
                Err(ParserError::PackageNotFound { path, reason })
            }
        }
    }

    /// Type check a loaded package by location or import path and return
    /// the oracle's result.
    pub fn type_check(&mut self, package: &str) -> Result<&CheckedPackage, ParserError> {
        let package = self
            .known_package(package)
            .unwrap_or_else(|| ImportPath::canonicalize(package));
        self.type_check_package(&package)?;
        self.checks
            .checked(package.as_str())
            .ok_or_else(|| ParserError::UnknownPackage(package.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::TypeExpr;

    fn checked(path: &str, named: &str) -> CheckedPackage {
        CheckedPackage {
            path: path.to_string(),
            name: "p".to_string(),
            named: [(
                named.to_string(),
                NamedType {
                    name: named.to_string(),
                    underlying: TypeExpr::basic("string"),
                    methods: Vec::new(),
                },
            )]
            .into_iter()
            .collect(),
            ..CheckedPackage::default()
        }
    }

    #[test]
    fn test_named_lookup_covers_partial_and_predeclared() {
        let mut cache = CheckCache::new(vec![NamedType {
            name: "error".to_string(),
            underlying: TypeExpr::Interface(Vec::new()),
            methods: Vec::new(),
        }]);
        cache.set(&ImportPath::raw("a"), CheckState::Done(checked("a", "A")));
        cache.set(
            &ImportPath::raw("b"),
            CheckState::Partial {
                checked: checked("b", "B"),
                message: "boom".to_string(),
            },
        );
        cache.set(&ImportPath::raw("c"), CheckState::InProgress);

        assert!(cache.named("a", "A").is_some());
        assert!(cache.named("b", "B").is_some());
        assert!(cache.named("c", "C").is_none());
        assert!(cache.named("", "error").is_some());
        assert!(cache.named("a", "Missing").is_none());
    }

    #[test]
    fn test_import_view_resolves_literals() {
        let mut cache = CheckCache::default();
        cache.set(&ImportPath::raw("lib/x"), CheckState::Done(checked("lib/x", "X")));
        let resolved: BTreeMap<String, ImportPath> = [(
            "example.com/app/vendor/lib/x".to_string(),
            ImportPath::raw("lib/x"),
        )]
        .into_iter()
        .collect();
        let view = ImportView {
            resolved: &resolved,
            checks: &cache,
        };
        assert_eq!(
            view.get("example.com/app/vendor/lib/x").map(|p| p.path.as_str()),
            Some("lib/x")
        );
        assert!(view.get("lib/x").is_none());
    }
}
