//! Package resolution and type graph building for gomodel
//!
//! A [`Builder`] locates packages, parses their files through a
//! [`Frontend`], type checks them (imports first) and flattens the checked
//! declarations into a [`gomodel_types::Universe`].
//!
//! ```ignore
//! let mut builder = Builder::new(BuilderConfig::default().with_go_env(), frontend);
//! builder.add_directory_recursive("./pkg")?;
//! let universe = builder.find_types()?;
//! ```

pub mod builder;
pub mod config;
pub mod constraint;
mod coordinator;
pub mod error;
pub mod locator;
pub mod oracle;
pub mod paths;
mod resolver;
pub mod source;
pub mod walker;

pub use builder::Builder;
pub use config::BuilderConfig;
pub use error::ParserError;
pub use locator::{BuildPackage, LocateError, PackageLocator, SourceTree};
pub use oracle::{
    ChanDir, CheckedPackage, FieldExpr, Frontend, ImportedPackages, MethodExpr, NamedType,
    Object, OracleError, SignatureExpr, TypeExpr,
};
pub use paths::ImportPath;
pub use source::{CommentGroup, CommentLookup, ParsedFile, Position, SourceIndex};
pub use walker::{NamedLookup, TypeGraphBuilder};
