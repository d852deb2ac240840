//! The Universe registry: every discovered package and its canonical nodes
//!
//! Accessors follow a get-or-create pattern. Asking for a name that has not
//! been seen creates a marker node (`Kind::Unknown`, or an empty
//! `Kind::DeclarationOf` for declarations); the caller that created it is
//! expected to finish construction through [`Universe::resolve`] or
//! [`Universe::declare`]. Nodes are never replaced or removed.

use crate::builtin::{canonical_builtin, BUILTIN_PACKAGE};
use crate::name::Name;
use crate::types::{Kind, KindTag, Type, TypeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Index;
use std::path::PathBuf;

/// Package-level information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Canonical package path.
    pub path: String,

    /// Directory the package was loaded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,

    /// Declared name from the `package x` clause.
    #[serde(default)]
    pub name: String,

    /// The package doc comment from `doc.go`, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub doc_comments: Vec<String>,

    /// Every comment in `doc.go`, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,

    /// Types declared in (or referenced under) this package, by local name.
    #[serde(default)]
    pub types: BTreeMap<String, TypeId>,

    /// Top-level functions by local name.
    #[serde(default)]
    pub functions: BTreeMap<String, TypeId>,

    /// Top-level variables by local name.
    #[serde(default)]
    pub variables: BTreeMap<String, TypeId>,

    /// Top-level constants by local name.
    #[serde(default)]
    pub constants: BTreeMap<String, TypeId>,

    /// Canonical paths of imported packages; each has an entry in the
    /// owning universe.
    #[serde(default)]
    pub imports: BTreeSet<String>,
}

impl Package {
    pub fn marker(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// True if `name` references a type known to this package.
    pub fn has(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn has_import(&self, path: &str) -> bool {
        self.imports.contains(path)
    }
}

/// All packages of one run, keyed by canonical path, plus the node arena.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    packages: BTreeMap<String, Package>,
    nodes: Vec<Type>,
}

/// Which name table of a package a declaration lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclTable {
    Functions,
    Variables,
    Constants,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the package record for `path`.
    pub fn package(&mut self, path: &str) -> &mut Package {
        self.packages
            .entry(path.to_string())
            .or_insert_with(|| Package::marker(path))
    }

    pub fn get_package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    /// Packages in lexicographic path order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn package_paths(&self) -> Vec<&str> {
        self.packages.keys().map(String::as_str).collect()
    }

    /// Get or create the canonical type node for `name`.
    ///
    /// Builtins are always found in the empty-path package, even when nothing
    /// registered them, and every spelling of a builtin returns the same node.
    pub fn ty(&mut self, name: &Name) -> TypeId {
        if let Some(id) = self.find_type(name) {
            return id;
        }

        if name.package == BUILTIN_PACKAGE {
            if let Some(canonical) = canonical_builtin(&name.name) {
                let id = if canonical == name.name {
                    self.push(Type::with_kind(Name::builtin(canonical), Kind::Builtin))
                } else {
                    self.ty(&Name::builtin(canonical))
                };
                self.package(BUILTIN_PACKAGE)
                    .types
                    .insert(name.name.clone(), id);
                return id;
            }
        }

        let id = self.push(Type::marker(name.clone()));
        self.package(&name.package)
            .types
            .insert(name.name.clone(), id);
        id
    }

    /// Look up a type node without creating one.
    pub fn find_type(&self, name: &Name) -> Option<TypeId> {
        self.packages
            .get(&name.package)
            .and_then(|p| p.types.get(&name.name))
            .copied()
    }

    /// Get or create the declaration node for a top-level function.
    pub fn function(&mut self, name: &Name) -> TypeId {
        self.declaration(name, DeclTable::Functions)
    }

    /// Get or create the declaration node for a top-level variable.
    pub fn variable(&mut self, name: &Name) -> TypeId {
        self.declaration(name, DeclTable::Variables)
    }

    /// Get or create the declaration node for a top-level constant.
    pub fn constant(&mut self, name: &Name) -> TypeId {
        self.declaration(name, DeclTable::Constants)
    }

    fn declaration(&mut self, name: &Name, table: DeclTable) -> TypeId {
        let existing = self.packages.get(&name.package).and_then(|p| {
            let map = match table {
                DeclTable::Functions => &p.functions,
                DeclTable::Variables => &p.variables,
                DeclTable::Constants => &p.constants,
            };
            map.get(&name.name).copied()
        });
        if let Some(id) = existing {
            return id;
        }

        let id = self.push(Type::with_kind(
            name.clone(),
            Kind::DeclarationOf { underlying: None },
        ));
        let package = self.package(&name.package);
        let map = match table {
            DeclTable::Functions => &mut package.functions,
            DeclTable::Variables => &mut package.variables,
            DeclTable::Constants => &mut package.constants,
        };
        map.insert(name.name.clone(), id);
        id
    }

    fn push(&mut self, node: Type) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.nodes[id.index()]
    }

    /// Set the kind of a marker node. The first writer wins: returns false
    /// and leaves the node untouched if its kind is already known.
    pub fn resolve(&mut self, id: TypeId, kind: Kind) -> bool {
        let node = self.get_mut(id);
        if node.is_resolved() {
            return false;
        }
        node.kind = kind;
        true
    }

    /// Record the declared type of a function, variable or constant node.
    /// Returns false if the node is not an unfinished declaration.
    pub fn declare(&mut self, id: TypeId, underlying: TypeId) -> bool {
        match &mut self.get_mut(id).kind {
            Kind::DeclarationOf { underlying: slot @ None } => {
                *slot = Some(underlying);
                true
            }
            _ => false,
        }
    }

    /// Register import edges for `package_path`. May be called repeatedly;
    /// imported packages get marker records when unknown. Paths must already
    /// be canonical.
    pub fn add_imports<I, S>(&mut self, package_path: &str, import_paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for import in import_paths {
            let import = import.into();
            self.package(&import);
            self.package(package_path).imports.insert(import);
        }
    }

    /// Packages imported by `package_path`, in path order.
    pub fn imports_of(&self, package_path: &str) -> Vec<&Package> {
        self.packages
            .get(package_path)
            .map(|p| {
                p.imports
                    .iter()
                    .filter_map(|i| self.packages.get(i))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All struct types of a package, in name order.
    pub fn structs(&self, package_path: &str) -> Vec<&Type> {
        self.types_of_kind(package_path, KindTag::Struct)
    }

    /// All interface types of a package, in name order.
    pub fn interfaces(&self, package_path: &str) -> Vec<&Type> {
        self.types_of_kind(package_path, KindTag::Interface)
    }

    fn types_of_kind(&self, package_path: &str, tag: KindTag) -> Vec<&Type> {
        self.packages
            .get(package_path)
            .map(|p| {
                p.types
                    .values()
                    .map(|id| self.get(*id))
                    .filter(|t| t.kind.tag() == tag)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Index<TypeId> for Universe {
    type Output = Type;

    fn index(&self, id: TypeId) -> &Type {
        self.get(id)
    }
}
