//! Canonical package and type model for gomodel
//!
//! A [`Universe`] maps canonical package paths to [`Package`] records and owns
//! an arena of [`Type`] nodes. Code generators read it after the parser crate
//! has built it; it is not mutated afterwards.

pub mod builtin;
pub mod name;
pub mod types;
pub mod universe;

pub use builtin::BUILTIN_PACKAGE;
pub use name::Name;
pub use types::{Kind, KindTag, Member, MemberDisplay, Signature, Type, TypeId};
pub use universe::{Package, Universe};
