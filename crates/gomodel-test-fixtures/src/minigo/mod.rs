//! A frontend for a small subset of Go
//!
//! Enough of the language to describe types: package clauses, imports,
//! type, func, var and const declarations. Function bodies are skipped.

mod check;
pub mod syntax;

pub use syntax::Unit;

use gomodel_parser::{
    CheckedPackage, Frontend, ImportedPackages, NamedType, OracleError, ParsedFile,
};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct MiniGo;

impl Frontend for MiniGo {
    type Unit = Unit;

    fn parse_file(&self, path: &Path, src: &str) -> Result<ParsedFile<Unit>, String> {
        syntax::parse_file(path, src)
    }

    fn check_package(
        &self,
        package: &str,
        files: &[ParsedFile<Unit>],
        imports: &dyn ImportedPackages,
    ) -> Result<CheckedPackage, OracleError> {
        check::check_package(package, files, imports)
    }

    fn predeclared(&self) -> Vec<NamedType> {
        vec![check::error_type()]
    }
}
