//! Flattening oracle types into canonical universe nodes
//!
//! [`TypeGraphBuilder::walk`] never fails: anything it has no category for
//! becomes `Kind::Unsupported`. Each node's kind is written once, after its
//! children are known. While a node is being populated its name sits in an
//! in-progress set, so a reference back to it (a struct holding a pointer to
//! itself) returns the node instead of recursing.

use crate::oracle::{MethodExpr, NamedType, SignatureExpr, TypeExpr};
use crate::source::{CommentLookup, Position};
use gomodel_types::{builtin, Kind, Member, Name, Signature, TypeId, Universe};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Finds named type definitions across every checked package.
pub trait NamedLookup {
    fn named(&self, package: &str, name: &str) -> Option<&NamedType>;
}

pub struct TypeGraphBuilder<'a> {
    universe: &'a mut Universe,
    named: &'a dyn NamedLookup,
    comments: &'a dyn CommentLookup,
    in_progress: HashSet<Name>,
}

impl<'a> TypeGraphBuilder<'a> {
    pub fn new(
        universe: &'a mut Universe,
        named: &'a dyn NamedLookup,
        comments: &'a dyn CommentLookup,
    ) -> Self {
        Self {
            universe,
            named,
            comments,
            in_progress: HashSet::new(),
        }
    }

    /// Canonical identity of a type: its package and name when named, its
    /// description in the builtin pseudo-package otherwise.
    pub fn canonical_name(ty: &TypeExpr) -> Name {
        match ty {
            TypeExpr::Named { package, name } => Name::new(package.clone(), name.clone()),
            TypeExpr::Basic(name) => Name::builtin(name.clone()),
            other => Name::builtin(other.to_string()),
        }
    }

    /// Add `ty` and every type it needs to the universe. `use_name` replaces
    /// the derived identity; methods and flattened named types use it.
    pub fn walk(&mut self, use_name: Option<Name>, ty: &TypeExpr) -> TypeId {
        match ty {
            TypeExpr::Basic(name) => self.walk_basic(name),
            TypeExpr::Named { package, name } => self.walk_named(package, name),
            _ => {
                let name = use_name.unwrap_or_else(|| Self::canonical_name(ty));
                self.walk_composite(name, ty)
            }
        }
    }

    fn walk_basic(&mut self, name: &str) -> TypeId {
        let id = self.universe.ty(&Name::builtin(name));
        if !builtin::is_builtin(name) {
            debug!("primitive {} is not registered", name);
            self.universe.resolve(id, Kind::Unsupported);
        }
        id
    }

    /// Get or create the node for `name` and report whether the caller should
    /// populate it.
    fn claim(&mut self, name: &Name) -> (TypeId, bool) {
        let id = self.universe.ty(name);
        let busy = self.universe[id].is_resolved() || self.in_progress.contains(name);
        (id, !busy)
    }

    fn walk_composite(&mut self, name: Name, ty: &TypeExpr) -> TypeId {
        let (id, fresh) = self.claim(&name);
        if !fresh {
            return id;
        }
        self.in_progress.insert(name.clone());

        let mut methods = BTreeMap::new();
        let kind = match ty {
            TypeExpr::Struct(fields) => {
                let members = fields
                    .iter()
                    .map(|field| Member {
                        name: field.name.clone(),
                        embedded: field.embedded,
                        tags: field.tag.clone(),
                        ty: self.walk(None, &field.ty),
                        comment_lines: self.comment_lines(field.pos.as_ref(), 1),
                    })
                    .collect();
                Kind::Struct { members }
            }
            TypeExpr::Map { key, elem } => {
                let elem = self.walk(None, elem);
                let key = self.walk(None, key);
                Kind::Map { key, elem }
            }
            TypeExpr::Pointer(elem) => Kind::Pointer {
                elem: self.walk(None, elem),
            },
            TypeExpr::Slice(elem) => Kind::Slice {
                elem: self.walk(None, elem),
            },
            // Length and direction are not tracked.
            TypeExpr::Array { elem, .. } => Kind::Array {
                elem: self.walk(None, elem),
            },
            TypeExpr::Chan { elem, .. } => Kind::Chan {
                elem: self.walk(None, elem),
            },
            TypeExpr::Signature(sig) => Kind::Func {
                signature: self.convert_signature(sig),
            },
            TypeExpr::Interface(method_set) => {
                for method in method_set {
                    let owner = declaring_interface(method).unwrap_or_else(|| name.clone());
                    let method_name = method_identity(&owner, &method.name);
                    methods.insert(method.name.clone(), self.walk_method(method_name, method));
                }
                Kind::Interface
            }
            TypeExpr::Basic(_) | TypeExpr::Named { .. } | TypeExpr::Other(_) => {
                debug!("Making unsupported type entry {} for: {:?}", name, ty);
                Kind::Unsupported
            }
        };

        self.universe.resolve(id, kind);
        if !methods.is_empty() {
            self.universe.get_mut(id).methods = methods;
        }
        self.in_progress.remove(&name);
        id
    }

    fn walk_named(&mut self, package: &str, local: &str) -> TypeId {
        let name = Name::new(package, local);
        let (id, fresh) = self.claim(&name);
        if !fresh {
            return id;
        }
        let named = self.named;
        let Some(def) = named.named(package, local) else {
            debug!("no definition for named type {}", name);
            self.universe.resolve(id, Kind::Unsupported);
            return id;
        };

        match &def.underlying {
            TypeExpr::Named { .. } | TypeExpr::Basic(_) | TypeExpr::Map { .. } | TypeExpr::Slice(_) => {
                self.in_progress.insert(name.clone());
                let underlying = self.walk(None, &def.underlying);
                self.universe.resolve(id, Kind::Alias { underlying });
                self.in_progress.remove(&name);
            }
            // A named type over an anonymous composite is one node carrying
            // the composite's kind.
            underlying => {
                self.walk(Some(name.clone()), underlying);
            }
        }

        if self.universe[id].methods.is_empty() && !def.methods.is_empty() {
            let mut methods = BTreeMap::new();
            for method in &def.methods {
                let method_name = method_identity(&name, &method.name);
                methods.insert(method.name.clone(), self.walk_method(method_name, method));
            }
            self.universe.get_mut(id).methods = methods;
        }
        id
    }

    fn walk_method(&mut self, name: Name, method: &MethodExpr) -> TypeId {
        let (id, fresh) = self.claim(&name);
        if fresh {
            self.in_progress.insert(name.clone());
            let signature = self.convert_signature(&method.signature);
            self.universe.resolve(id, Kind::Func { signature });
            self.in_progress.remove(&name);
        }

        let lines = self.comment_lines(method.pos.as_ref(), 1);
        let node = self.universe.get_mut(id);
        if let Kind::Func { signature } = &mut node.kind {
            signature.comment_lines = lines.clone();
        }
        node.comment_lines = lines;
        id
    }

    fn convert_signature(&mut self, sig: &SignatureExpr) -> Signature {
        let parameters = sig.params.iter().map(|p| self.walk(None, p)).collect();
        let results = sig.results.iter().map(|r| self.walk(None, r)).collect();
        let receiver = sig.receiver.as_ref().map(|r| self.walk(None, r));
        Signature {
            receiver,
            parameters,
            results,
            variadic: sig.variadic,
            comment_lines: Vec::new(),
        }
    }

    /// Declare a top-level function.
    pub fn add_function(&mut self, name: &Name, sig: &SignatureExpr) -> TypeId {
        let id = self.universe.function(name);
        let underlying = self.walk(None, &TypeExpr::Signature(Box::new(sig.clone())));
        self.universe.declare(id, underlying);
        id
    }

    /// Declare a top-level variable.
    pub fn add_variable(&mut self, name: &Name, ty: &TypeExpr) -> TypeId {
        let id = self.universe.variable(name);
        let underlying = self.walk(None, ty);
        self.universe.declare(id, underlying);
        id
    }

    /// Declare a top-level constant.
    pub fn add_constant(&mut self, name: &Name, ty: &TypeExpr) -> TypeId {
        let id = self.universe.constant(name);
        let underlying = self.walk(None, ty);
        self.universe.declare(id, underlying);
        id
    }

    /// Attach the closest and second closest comment blocks above `pos` to
    /// the node. Existing comments are overwritten.
    pub fn attach_doc(&mut self, id: TypeId, pos: Option<&Position>) {
        let Some(pos) = pos else {
            return;
        };
        let closest = self.comments.prior_comment(pos, 1);
        let second = match closest {
            None => self.comments.prior_comment(pos, 2),
            Some(group) => self
                .comments
                .prior_comment(&Position::new(pos.file.clone(), group.start_line), 2),
        };
        let comment_lines = closest.map(|g| g.text_lines()).unwrap_or_default();
        let second_lines = second.map(|g| g.text_lines()).unwrap_or_default();

        let node = self.universe.get_mut(id);
        node.comment_lines = comment_lines;
        node.second_closest_comment_lines = second_lines;
    }

    fn comment_lines(&self, pos: Option<&Position>, lines: u32) -> Vec<String> {
        pos.and_then(|p| self.comments.prior_comment(p, lines))
            .map(|g| g.text_lines())
            .unwrap_or_default()
    }
}

/// Methods are identified by their owner: `Point.Dist` in the owner's package.
fn method_identity(owner: &Name, method: &str) -> Name {
    Name::new(owner.package.clone(), format!("{}.{}", owner.name, method))
}

/// Interface methods promoted through embedding keep the interface that
/// declared them as their receiver.
fn declaring_interface(method: &MethodExpr) -> Option<Name> {
    match method.signature.receiver.as_ref()? {
        TypeExpr::Named { package, name } => Some(Name::new(package.clone(), name.clone())),
        _ => None,
    }
}
