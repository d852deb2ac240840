//! The external frontend: source parsing and the type-checking oracle
//!
//! gomodel does not parse or type check anything itself. A [`Frontend`]
//! turns source text into [`ParsedFile`]s and a package's parsed files into a
//! [`CheckedPackage`] whose declarations carry full structural types.

use crate::source::{ParsedFile, Position};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Parser plus type checker for one source language.
pub trait Frontend {
    /// The frontend's parsed representation of one file.
    type Unit;

    /// Parse one file. The error is a human readable message.
    fn parse_file(&self, path: &Path, src: &str) -> Result<ParsedFile<Self::Unit>, String>;

    /// Type check a package. `imports` resolves each import literal of the
    /// package's files to an already checked package, when one exists.
    fn check_package(
        &self,
        package: &str,
        files: &[ParsedFile<Self::Unit>],
        imports: &dyn ImportedPackages,
    ) -> Result<CheckedPackage, OracleError>;

    /// Named types that exist without any package, such as `error`.
    fn predeclared(&self) -> Vec<NamedType> {
        Vec::new()
    }
}

/// Already checked packages visible to the package being checked.
pub trait ImportedPackages {
    /// The checked package for an import literal as written in source.
    fn get(&self, import: &str) -> Option<&CheckedPackage>;
}

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// Checking produced errors. `partial` carries whatever was resolved.
    #[error("{message}")]
    Check {
        message: String,
        partial: Option<Box<CheckedPackage>>,
    },
}

/// The oracle's result for one package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckedPackage {
    /// Canonical package path.
    pub path: String,
    /// Declared package name.
    pub name: String,
    /// Top-level objects of the package scope.
    pub objects: Vec<Object>,
    /// Definitions of the named types declared in this package.
    pub named: BTreeMap<String, NamedType>,
    /// Non-blocking complaints from the checker.
    pub diagnostics: Vec<String>,
}

impl CheckedPackage {
    /// Scope objects sorted by name.
    pub fn sorted_objects(&self) -> Vec<&Object> {
        let mut objects: Vec<&Object> = self.objects.iter().collect();
        objects.sort_by(|a, b| a.name().cmp(b.name()));
        objects
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    TypeName {
        name: String,
        pos: Option<Position>,
        ty: TypeExpr,
    },
    Func {
        name: String,
        pos: Option<Position>,
        signature: SignatureExpr,
    },
    Var {
        name: String,
        pos: Option<Position>,
        ty: TypeExpr,
    },
    Const {
        name: String,
        pos: Option<Position>,
        ty: TypeExpr,
    },
}

impl Object {
    pub fn name(&self) -> &str {
        match self {
            Object::TypeName { name, .. }
            | Object::Func { name, .. }
            | Object::Var { name, .. }
            | Object::Const { name, .. } => name,
        }
    }

    pub fn pos(&self) -> Option<&Position> {
        match self {
            Object::TypeName { pos, .. }
            | Object::Func { pos, .. }
            | Object::Var { pos, .. }
            | Object::Const { pos, .. } => pos.as_ref(),
        }
    }
}

/// A named type's definition.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    pub name: String,
    pub underlying: TypeExpr,
    /// Methods declared directly on the type.
    pub methods: Vec<MethodExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodExpr {
    pub name: String,
    pub pos: Option<Position>,
    pub signature: SignatureExpr,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureExpr {
    pub receiver: Option<TypeExpr>,
    pub params: Vec<TypeExpr>,
    pub results: Vec<TypeExpr>,
    /// The last parameter is `...T`; it is stored as a slice.
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldExpr {
    pub name: String,
    pub embedded: bool,
    pub tag: String,
    pub ty: TypeExpr,
    pub pos: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A resolved type as reported by the oracle.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A primitive by name, e.g. `int` or `untyped string`.
    Basic(String),
    /// A reference to a named type; its definition is looked up by package
    /// and name. Predeclared types use the empty package.
    Named { package: String, name: String },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array { len: u64, elem: Box<TypeExpr> },
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    Map { key: Box<TypeExpr>, elem: Box<TypeExpr> },
    Struct(Vec<FieldExpr>),
    Signature(Box<SignatureExpr>),
    /// Complete method set.
    Interface(Vec<MethodExpr>),
    /// Anything the model has no category for, by description.
    Other(String),
}

impl TypeExpr {
    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeExpr::Named {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn basic(name: impl Into<String>) -> Self {
        TypeExpr::Basic(name.into())
    }

    pub fn pointer(elem: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(elem))
    }

    pub fn slice(elem: TypeExpr) -> Self {
        TypeExpr::Slice(Box::new(elem))
    }

    pub fn map(key: TypeExpr, elem: TypeExpr) -> Self {
        TypeExpr::Map {
            key: Box::new(key),
            elem: Box::new(elem),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[TypeExpr], variadic: bool) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match ty {
            TypeExpr::Slice(elem) if variadic && i + 1 == types.len() => write!(f, "...{elem}")?,
            _ => write!(f, "{ty}")?,
        }
    }
    Ok(())
}

impl fmt::Display for SignatureExpr {
    /// Parameters and results without the `func` keyword: `(int) string`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_list(f, &self.params, self.variadic)?;
        f.write_str(")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single @ TypeExpr::Signature(_)] => write!(f, " ({single})"),
            [single] => write!(f, " {single}"),
            many => {
                f.write_str(" (")?;
                write_list(f, many, false)?;
                f.write_str(")")
            }
        }
    }
}

/// Renders the structural description used as the identity of anonymous
/// types, with package paths as qualifiers: `map[string]*example.com/p.T`.
impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Basic(name) => f.write_str(name),
            TypeExpr::Named { package, name } if package.is_empty() => f.write_str(name),
            TypeExpr::Named { package, name } => write!(f, "{package}.{name}"),
            TypeExpr::Pointer(elem) => write!(f, "*{elem}"),
            TypeExpr::Slice(elem) => write!(f, "[]{elem}"),
            TypeExpr::Array { len, elem } => write!(f, "[{len}]{elem}"),
            TypeExpr::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {elem}"),
                ChanDir::Send => write!(f, "chan<- {elem}"),
                ChanDir::Recv => write!(f, "<-chan {elem}"),
            },
            TypeExpr::Map { key, elem } => write!(f, "map[{key}]{elem}"),
            TypeExpr::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                    if !field.tag.is_empty() {
                        write!(f, " {:?}", field.tag)?;
                    }
                }
                f.write_str("}")
            }
            TypeExpr::Signature(sig) => write!(f, "func{sig}"),
            TypeExpr::Interface(methods) => {
                f.write_str("interface{")?;
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}{}", method.name, method.signature)?;
                }
                f.write_str("}")
            }
            TypeExpr::Other(description) => f.write_str(description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptions() {
        let point = TypeExpr::named("example.com/shapes", "Point");
        assert_eq!(TypeExpr::pointer(point.clone()).to_string(), "*example.com/shapes.Point");
        assert_eq!(
            TypeExpr::map(TypeExpr::basic("string"), TypeExpr::slice(point.clone())).to_string(),
            "map[string][]example.com/shapes.Point"
        );
        assert_eq!(TypeExpr::named("", "error").to_string(), "error");

        let sig = SignatureExpr {
            receiver: None,
            params: vec![TypeExpr::basic("string"), TypeExpr::slice(TypeExpr::basic("int"))],
            results: vec![TypeExpr::basic("int"), TypeExpr::named("", "error")],
            variadic: true,
        };
        assert_eq!(
            TypeExpr::Signature(Box::new(sig)).to_string(),
            "func(string, ...int) (int, error)"
        );

        let st = TypeExpr::Struct(vec![
            FieldExpr {
                name: "N".into(),
                embedded: false,
                tag: "json:\"n\"".into(),
                ty: TypeExpr::basic("int"),
                pos: None,
            },
            FieldExpr {
                name: "Point".into(),
                embedded: true,
                tag: String::new(),
                ty: point,
                pos: None,
            },
        ]);
        assert_eq!(
            st.to_string(),
            "struct{N int \"json:\\\"n\\\"\"; example.com/shapes.Point}"
        );

        let chan = TypeExpr::Chan {
            dir: ChanDir::Recv,
            elem: Box::new(TypeExpr::basic("int")),
        };
        assert_eq!(chan.to_string(), "<-chan int");
        assert_eq!(TypeExpr::Interface(Vec::new()).to_string(), "interface{}");
    }

    #[test]
    fn test_sorted_objects() {
        let pkg = CheckedPackage {
            objects: vec![
                Object::Var {
                    name: "b".into(),
                    pos: None,
                    ty: TypeExpr::basic("int"),
                },
                Object::Const {
                    name: "a".into(),
                    pos: None,
                    ty: TypeExpr::basic("int"),
                },
            ],
            ..CheckedPackage::default()
        };
        let names: Vec<&str> = pkg.sorted_objects().iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
