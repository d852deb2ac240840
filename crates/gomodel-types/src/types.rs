//! Canonical type nodes using algebraic data types
//!
//! Every node lives in the [`Universe`](crate::Universe) arena and is addressed
//! by a [`TypeId`]. Two references to the same canonical name always carry the
//! same id, so identity comparison is id equality.

use crate::name::Name;
use crate::universe::Universe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Handle to a node in the universe arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The structural category of a node, with the fields that only make sense
/// for that category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Kind {
    /// Marker: referenced but not populated yet.
    #[default]
    Unknown,
    /// A primitive such as `bool`, `string` or `int`.
    Builtin,
    Struct {
        members: Vec<Member>,
    },
    Map {
        key: TypeId,
        elem: TypeId,
    },
    Slice {
        elem: TypeId,
    },
    /// Fixed-size array. The length is not tracked.
    Array {
        elem: TypeId,
    },
    Pointer {
        elem: TypeId,
    },
    /// Channel. The direction is not tracked.
    Chan {
        elem: TypeId,
    },
    Func {
        signature: Signature,
    },
    /// Method set lives in [`Type::methods`].
    Interface,
    /// A named type whose underlying shape is itself named, primitive,
    /// a map or a slice:
    ///
    /// ```text
    /// type Foo string
    /// type Bar Foo
    /// ```
    ///
    /// `Foo` and `Bar` are both aliases; `Bar.underlying` is `Foo`.
    Alias {
        underlying: TypeId,
    },
    /// A top-level function, variable or constant rather than a type. The
    /// declared entity's type is `underlying` once the declaration is walked.
    DeclarationOf {
        underlying: Option<TypeId>,
    },
    Unsupported,
}

impl Kind {
    pub fn tag(&self) -> KindTag {
        match self {
            Kind::Unknown => KindTag::Unknown,
            Kind::Builtin => KindTag::Builtin,
            Kind::Struct { .. } => KindTag::Struct,
            Kind::Map { .. } => KindTag::Map,
            Kind::Slice { .. } => KindTag::Slice,
            Kind::Array { .. } => KindTag::Array,
            Kind::Pointer { .. } => KindTag::Pointer,
            Kind::Chan { .. } => KindTag::Chan,
            Kind::Func { .. } => KindTag::Func,
            Kind::Interface => KindTag::Interface,
            Kind::Alias { .. } => KindTag::Alias,
            Kind::DeclarationOf { .. } => KindTag::DeclarationOf,
            Kind::Unsupported => KindTag::Unsupported,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Kind::Unknown)
    }

    /// Element type of container kinds.
    pub fn elem(&self) -> Option<TypeId> {
        match self {
            Kind::Map { elem, .. }
            | Kind::Slice { elem }
            | Kind::Array { elem }
            | Kind::Pointer { elem }
            | Kind::Chan { elem } => Some(*elem),
            _ => None,
        }
    }

    /// Key type of maps.
    pub fn key(&self) -> Option<TypeId> {
        match self {
            Kind::Map { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// Underlying type of aliases and declarations.
    pub fn underlying(&self) -> Option<TypeId> {
        match self {
            Kind::Alias { underlying } => Some(*underlying),
            Kind::DeclarationOf { underlying } => *underlying,
            _ => None,
        }
    }

    pub fn members(&self) -> &[Member] {
        match self {
            Kind::Struct { members } => members,
            _ => &[],
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Kind::Func { signature } => Some(signature),
            _ => None,
        }
    }
}

/// Field-less view of [`Kind`], handy for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KindTag {
    Unknown,
    Builtin,
    Struct,
    Map,
    Slice,
    Array,
    Pointer,
    Chan,
    Func,
    Interface,
    Alias,
    DeclarationOf,
    Unsupported,
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KindTag::Unknown => "Unknown",
            KindTag::Builtin => "Builtin",
            KindTag::Struct => "Struct",
            KindTag::Map => "Map",
            KindTag::Slice => "Slice",
            KindTag::Array => "Array",
            KindTag::Pointer => "Pointer",
            KindTag::Chan => "Chan",
            KindTag::Func => "Func",
            KindTag::Interface => "Interface",
            KindTag::Alias => "Alias",
            KindTag::DeclarationOf => "DeclarationOf",
            KindTag::Unsupported => "Unsupported",
        };
        f.write_str(s)
    }
}

/// A canonical type node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    pub name: Name,
    pub kind: Kind,

    /// Comment lines immediately before the definition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment_lines: Vec<String>,

    /// The comment block separated from the definition (or from
    /// `comment_lines`) by one blank line:
    ///
    /// ```text
    /// // second closest
    ///
    /// // closest
    /// type Foo struct{}
    /// ```
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub second_closest_comment_lines: Vec<String>,

    /// For interfaces, the complete method set. For other named types, the
    /// methods declared on the type. Every value has `Kind::Func`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<String, TypeId>,
}

impl Type {
    pub fn marker(name: Name) -> Self {
        Self {
            name,
            kind: Kind::Unknown,
            comment_lines: Vec::new(),
            second_closest_comment_lines: Vec::new(),
            methods: BTreeMap::new(),
        }
    }

    pub fn with_kind(name: Name, kind: Kind) -> Self {
        Self {
            kind,
            ..Self::marker(name)
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.kind.is_unknown()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}

/// A function's signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Set for methods: the type the method is declared on.
    pub receiver: Option<TypeId>,
    pub parameters: Vec<TypeId>,
    pub results: Vec<TypeId>,
    /// True if the last parameter is of the form `...T`.
    pub variadic: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment_lines: Vec<String>,
}

/// A single struct member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    /// Embedded members carry the type name as `name`.
    pub embedded: bool,
    /// Raw tag literal contents, e.g. `json:"name,omitempty"`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tags: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment_lines: Vec<String>,
    #[serde(rename = "type")]
    pub ty: TypeId,
}

impl Member {
    /// Formats as `name type`, resolving the member type in `universe`.
    pub fn display<'a>(&'a self, universe: &'a Universe) -> MemberDisplay<'a> {
        MemberDisplay {
            member: self,
            universe,
        }
    }
}

pub struct MemberDisplay<'a> {
    member: &'a Member,
    universe: &'a Universe,
}

impl fmt::Display for MemberDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.member.name, self.universe[self.member.ty])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_accessors() {
        let map = Kind::Map {
            key: TypeId(1),
            elem: TypeId(2),
        };
        assert_eq!(map.key(), Some(TypeId(1)));
        assert_eq!(map.elem(), Some(TypeId(2)));
        assert_eq!(map.underlying(), None);
        assert_eq!(map.tag(), KindTag::Map);

        let decl = Kind::DeclarationOf { underlying: None };
        assert_eq!(decl.underlying(), None);
        assert!(decl.members().is_empty());
    }

    #[test]
    fn test_marker_is_unresolved() {
        let t = Type::marker(Name::new("p", "T"));
        assert!(!t.is_resolved());
        assert_eq!(t.kind.tag().to_string(), "Unknown");
    }

    #[test]
    fn test_member_displays_name_and_type() {
        let mut u = Universe::new();
        let point = u.ty(&Name::new("example.com/shapes", "Point"));
        let int = u.ty(&Name::builtin("int"));
        let x = Member {
            name: "X".to_string(),
            embedded: false,
            tags: String::new(),
            comment_lines: Vec::new(),
            ty: int,
        };
        let origin = Member {
            name: "Origin".to_string(),
            ty: point,
            ..x.clone()
        };
        assert_eq!(x.display(&u).to_string(), "X int");
        assert_eq!(origin.display(&u).to_string(), "Origin example.com/shapes.Point");
    }
}
