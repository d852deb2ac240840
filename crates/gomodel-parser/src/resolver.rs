//! Package resolution and source loading
//!
//! Locations are resolved to packages through the locator, canonicalized and
//! parsed file by file into the source index. Whether a failure is fatal
//! depends on who asked: packages named by the caller must load, packages
//! pulled in by an import may quietly fail.

use crate::builder::Builder;
use crate::error::ParserError;
use crate::locator::{BuildPackage, LocateError};
use crate::oracle::Frontend;
use crate::paths::ImportPath;
use std::fs;
use std::path::Path;
use tracing::{debug, instrument, warn};

impl<F: Frontend> Builder<F> {
    /// Load and type check the package at `location`. Returns `None` when a
    /// transitive package could not be loaded and the failure was absorbed.
    #[instrument(skip(self), level = "debug")]
    pub(crate) fn import_package(
        &mut self,
        location: &str,
        user_requested: bool,
    ) -> Result<Option<ImportPath>, ParserError> {
        let package = match self.known_package(location) {
            Some(package) if self.sources.has_package(&package) => package,
            _ => match self.add_dir(location) {
                Ok(package) => package,
                Err(e) => return Self::absorb(location, user_requested, e),
            },
        };

        // Only packages that checked cleanly are walked by find_types.
        match self.type_check_package(&package) {
            Ok(()) if user_requested => {
                self.user_requested.insert(package.clone());
            }
            Ok(()) => {}
            Err(e) => {
                Self::absorb(location, user_requested, e)?;
            }
        }
        Ok(Some(package))
    }

    fn absorb(
        location: &str,
        user_requested: bool,
        err: ParserError,
    ) -> Result<Option<ImportPath>, ParserError> {
        if !user_requested && err.is_recoverable_when_transitive() {
            if err.is_package_not_found() {
                warn!("Ignoring missing transitive package {}", location);
            } else {
                warn!("Ignoring transitive package {}: {}", location, err);
            }
            return Ok(None);
        }
        Err(err)
    }

    /// Canonical path of a location that has been located before.
    pub(crate) fn known_package(&self, location: &str) -> Option<ImportPath> {
        self.build_packages
            .get(location)
            .map(|build| ImportPath::canonicalize(&build.import_path))
    }

    /// Locate `location`, check it agrees with earlier resolutions of the
    /// same canonical path, and parse its files.
    pub(crate) fn add_dir(&mut self, location: &str) -> Result<ImportPath, ParserError> {
        let build = self.import_build_package(location)?;
        let package = ImportPath::canonicalize(&build.import_path);
        if location != package.as_str() {
            debug!("{} has canonical path {}", location, package);
        }

        match self.abs_paths.get(&package) {
            Some(previous) if previous != &build.dir => {
                return Err(ParserError::DuplicateResolution {
                    package: package.to_string(),
                    dir: build.dir,
                    previous: previous.clone(),
                });
            }
            Some(_) => {}
            None => {
                self.abs_paths.insert(package.clone(), build.dir.clone());
            }
        }

        let mut files = build.go_files.clone();
        if self.config.include_test_files {
            files.extend(build.test_go_files.iter().cloned());
        }
        if files.is_empty() {
            return Err(ParserError::NoSource(location.to_string()));
        }

        for file in &files {
            let path = build.dir.join(file);
            let src = fs::read_to_string(&path).map_err(|e| ParserError::file_system(&path, e))?;
            self.add_file(&package, &path, &src)?;
        }
        Ok(package)
    }

    /// Locate `location`, remembering the result under the given name and
    /// under its canonical path. A directory without source is remembered
    /// too, so recursive walks can still use it.
    pub(crate) fn import_build_package(&mut self, location: &str) -> Result<BuildPackage, ParserError> {
        if let Some(build) = self.build_packages.get(location) {
            return Ok(build.clone());
        }

        let build = match self.locator.locate(location, &self.tags) {
            Ok(build) | Err(LocateError::NoSource(build)) => build,
            Err(LocateError::NotFound { location, searched }) => {
                return Err(ParserError::PackageNotFound {
                    path: location,
                    reason: format!("not found in any of {searched:?}"),
                });
            }
            Err(LocateError::Io { path, source }) => {
                return Err(ParserError::file_system(path, source));
            }
        };

        debug!("saving build package {}", location);
        self.build_packages
            .insert(location.to_string(), build.clone());
        let canonical = ImportPath::canonicalize(&build.import_path);
        if canonical.as_str() != location {
            self.build_packages
                .entry(canonical.to_string())
                .or_insert_with(|| build.clone());
        }
        Ok(build)
    }

    /// Parse one file into `package`. Files already parsed are skipped.
    pub(crate) fn add_file(
        &mut self,
        package: &ImportPath,
        path: &Path,
        src: &str,
    ) -> Result<(), ParserError> {
        if self.sources.contains_file(package, path) {
            debug!("{} {} already parsed, skipping", package, path.display());
            return Ok(());
        }
        debug!("adding file {} {}", package, path.display());

        let mut parsed = self
            .frontend
            .parse_file(path, src)
            .map_err(|message| ParserError::Parse {
                file: path.to_path_buf(),
                message,
            })?;
        parsed.path = path.to_path_buf();
        self.sources.insert(package, parsed);
        Ok(())
    }
}
