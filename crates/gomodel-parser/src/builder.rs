//! The entry point: register packages, then build the universe

use crate::config::BuilderConfig;
use crate::constraint::default_tags;
use crate::coordinator::CheckCache;
use crate::error::ParserError;
use crate::locator::{BuildPackage, PackageLocator, SourceTree};
use crate::oracle::{Frontend, Object};
use crate::paths::{is_in_vcs_dir, to_slash, ImportPath};
use crate::source::SourceIndex;
use crate::walker::TypeGraphBuilder;
use gomodel_types::{Name, Universe};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use walkdir::WalkDir;

/// Drives a [`Frontend`] over a set of packages and flattens the result into
/// a [`Universe`].
///
/// One builder serves one run: every cache it holds (located packages,
/// parsed files, type-check results) is scoped to it.
pub struct Builder<F: Frontend> {
    pub(crate) frontend: F,
    pub(crate) locator: Box<dyn PackageLocator>,
    pub(crate) config: BuilderConfig,
    pub(crate) tags: BTreeSet<String>,
    /// Located packages, by every name they were asked for.
    pub(crate) build_packages: HashMap<String, BuildPackage>,
    /// Directory each canonical path resolved to.
    pub(crate) abs_paths: HashMap<ImportPath, PathBuf>,
    pub(crate) sources: SourceIndex<F::Unit>,
    pub(crate) checks: CheckCache,
    pub(crate) user_requested: BTreeSet<ImportPath>,
}

impl<F: Frontend> Builder<F> {
    /// A builder locating packages on disk through a [`SourceTree`].
    pub fn new(config: BuilderConfig, frontend: F) -> Self {
        let locator = Box::new(SourceTree::from_config(&config));
        Self::with_locator(config, frontend, locator)
    }

    pub fn with_locator(
        config: BuilderConfig,
        frontend: F,
        locator: Box<dyn PackageLocator>,
    ) -> Self {
        let mut tags = default_tags();
        tags.extend(config.build_tags.iter().cloned());
        let checks = CheckCache::new(frontend.predeclared());
        Self {
            frontend,
            locator,
            config,
            tags,
            build_packages: HashMap::new(),
            abs_paths: HashMap::new(),
            sources: SourceIndex::new(),
            checks,
            user_requested: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Tags satisfied by this run, including the host platform's.
    pub fn build_tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Add build tags for packages located from now on.
    pub fn add_build_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            self.tags.insert(tag.clone());
            self.config.build_tags.push(tag);
        }
    }

    /// Register the package at `location` and, for type visibility only,
    /// every package it imports.
    #[instrument(skip(self))]
    pub fn add_directory(&mut self, location: &str) -> Result<(), ParserError> {
        self.import_package(location, true)?;
        Ok(())
    }

    /// Like [`add_directory`](Self::add_directory), and also registers every
    /// directory below `location` that holds source. The root must resolve;
    /// subdirectories without source are skipped.
    #[instrument(skip(self))]
    pub fn add_directory_recursive(&mut self, location: &str) -> Result<(), ParserError> {
        match self.import_package(location, true) {
            Ok(_) => {}
            Err(ParserError::NoSource(_)) | Err(ParserError::NoFiles(_)) => {
                debug!("no source at root {}, walking children", location);
            }
            Err(e) => return Err(e),
        }

        let root = self
            .build_packages
            .get(location)
            .cloned()
            .ok_or_else(|| ParserError::PackageNotFound {
                path: location.to_string(),
                reason: "root was not located".to_string(),
            })?;
        let root_package = ImportPath::canonicalize(&root.import_path);

        let walker = WalkDir::new(&root.dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_in_vcs_dir(Path::new(entry.file_name())));
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(PathBuf::from).unwrap_or_else(|| root.dir.clone());
                ParserError::file_system(path, e.into())
            })?;
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&root.dir) else {
                continue;
            };
            let child = root_package.join(&to_slash(rel));
            match self.import_package(child.as_str(), true) {
                Ok(_) => {}
                Err(
                    e @ (ParserError::NoSource(_)
                    | ParserError::NoFiles(_)
                    | ParserError::PackageNotFound { .. }),
                ) => {
                    debug!("Ignoring child directory {}: {}", child, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Build the universe from every requested package, in path order.
    /// Imported packages appear only as far as requested packages reference
    /// them.
    #[instrument(skip(self))]
    pub fn find_types(&self) -> Result<Universe, ParserError> {
        let mut universe = Universe::new();
        for package in self.sources.packages() {
            self.find_types_in(package, &mut universe)?;
        }
        debug!("universe has {} nodes", universe.node_count());
        Ok(universe)
    }

    fn find_types_in(&self, package: &ImportPath, universe: &mut Universe) -> Result<(), ParserError> {
        if !self.user_requested.contains(package) {
            debug!("{} is not user requested, skipping", package);
            return Ok(());
        }
        let checked = self
            .checks
            .checked(package.as_str())
            .ok_or_else(|| ParserError::UnknownPackage(package.to_string()))?;
        debug!("finding types in {}", package);

        let record = universe.package(package.as_str());
        record.name = checked.name.clone();
        record.source_path = self.abs_paths.get(package).cloned();
        for file in self.sources.files(package) {
            if file.file_name() != Some("doc.go") {
                continue;
            }
            record.comments = file.comments.iter().flat_map(|g| g.text_lines()).collect();
            if let Some(doc) = &file.doc {
                record.doc_comments = doc.text_lines();
            }
        }

        let mut walker = TypeGraphBuilder::new(universe, &self.checks, &self.sources);
        for object in checked.sorted_objects() {
            let name = Name::new(package.as_str(), object.name());
            match object {
                Object::TypeName { ty, .. } => {
                    let id = walker.walk(None, ty);
                    walker.attach_doc(id, object.pos());
                }
                // Methods are reached through their receiver type.
                Object::Func { signature, .. } if signature.receiver.is_some() => {}
                Object::Func { signature, .. } => {
                    let id = walker.add_function(&name, signature);
                    walker.attach_doc(id, object.pos());
                }
                Object::Var { ty, .. } => {
                    walker.add_variable(&name, ty);
                }
                Object::Const { ty, .. } => {
                    walker.add_constant(&name, ty);
                }
            }
        }

        let imports = self
            .sources
            .imports(package)
            .into_iter()
            .map(|import| ImportPath::canonicalize(&import).to_string());
        universe.add_imports(package.as_str(), imports);
        Ok(())
    }
}
