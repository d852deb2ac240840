//! Resolving parsed declarations into a checked package

use super::syntax::{Ast, AstField, AstMethod, AstSignature, Decl, Unit};
use gomodel_parser::{
    CheckedPackage, FieldExpr, ImportedPackages, MethodExpr, NamedType, Object, OracleError,
    ParsedFile, Position, SignatureExpr, TypeExpr,
};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const BASIC: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "uintptr", "byte", "rune", "float32", "float64", "complex64",
    "complex128",
];

/// `type error interface { Error() string }`
pub(crate) fn error_type() -> NamedType {
    NamedType {
        name: "error".to_string(),
        underlying: TypeExpr::Interface(vec![MethodExpr {
            name: "Error".to_string(),
            pos: None,
            signature: SignatureExpr {
                receiver: Some(TypeExpr::named("", "error")),
                params: Vec::new(),
                results: vec![TypeExpr::basic("string")],
                variadic: false,
            },
        }]),
        methods: Vec::new(),
    }
}

#[derive(Clone, Copy)]
struct LocalType<'a> {
    ast: &'a Ast,
    alias: bool,
    file: usize,
}

struct FileScope<'a> {
    path: &'a Path,
    /// Package name as used in the file to import literal.
    names: HashMap<String, String>,
}

struct Resolver<'a> {
    package: &'a str,
    imports: &'a dyn ImportedPackages,
    types: BTreeMap<&'a str, LocalType<'a>>,
    files: Vec<FileScope<'a>>,
    current: usize,
    errors: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn pos(&self, line: u32) -> Option<Position> {
        Some(Position::new(self.files[self.current].path, line))
    }

    fn error(&mut self, message: String) -> TypeExpr {
        let path = self.files[self.current].path.display().to_string();
        self.errors.push(format!("{path}: {message}"));
        TypeExpr::Other("invalid type".to_string())
    }

    /// Run `f` with positions and import names taken from another file.
    fn in_file<T>(&mut self, file: usize, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.current, file);
        let result = f(self);
        self.current = saved;
        result
    }

    fn convert(&mut self, ast: &Ast) -> TypeExpr {
        match ast {
            Ast::Ident(name) => self.ident(name),
            Ast::Qualified(package, name) => self.qualified(package, name),
            Ast::Pointer(elem) => TypeExpr::pointer(self.convert(elem)),
            Ast::Slice(elem) => TypeExpr::slice(self.convert(elem)),
            Ast::Array(len, elem) => TypeExpr::Array {
                len: *len,
                elem: Box::new(self.convert(elem)),
            },
            Ast::Map(key, elem) => {
                let key = self.convert(key);
                TypeExpr::map(key, self.convert(elem))
            }
            Ast::Chan(dir, elem) => TypeExpr::Chan {
                dir: *dir,
                elem: Box::new(self.convert(elem)),
            },
            Ast::Func(sig) => TypeExpr::Signature(Box::new(self.signature(sig, None))),
            Ast::Struct(fields) => TypeExpr::Struct(fields.iter().map(|f| self.field(f)).collect()),
            Ast::Interface(methods) => TypeExpr::Interface(self.method_set(methods, None)),
        }
    }

    fn ident(&mut self, name: &str) -> TypeExpr {
        if BASIC.contains(&name) {
            return TypeExpr::basic(name);
        }
        if let Some(local) = self.types.get(name).copied() {
            if local.alias {
                return self.in_file(local.file, |r| r.convert(local.ast));
            }
            return TypeExpr::named(self.package, name);
        }
        match name {
            "error" => TypeExpr::named("", "error"),
            "any" => TypeExpr::Interface(Vec::new()),
            _ => self.error(format!("undefined: {name}")),
        }
    }

    fn qualified(&mut self, package: &str, name: &str) -> TypeExpr {
        let Some(literal) = self.files[self.current].names.get(package).cloned() else {
            return self.error(format!("undefined: {package}"));
        };
        let imports = self.imports;
        let Some(imported) = imports.get(&literal) else {
            // Reported once per import already.
            return TypeExpr::Other("invalid type".to_string());
        };
        let found = imported.objects.iter().find_map(|object| match object {
            Object::TypeName { name: n, ty, .. } if n == name => Some(ty.clone()),
            _ => None,
        });
        match found {
            Some(ty) => ty,
            None => self.error(format!("undefined: {package}.{name}")),
        }
    }

    fn signature(&mut self, sig: &AstSignature, receiver: Option<TypeExpr>) -> SignatureExpr {
        SignatureExpr {
            receiver,
            params: sig.params.iter().map(|p| self.convert(p)).collect(),
            results: sig.results.iter().map(|r| self.convert(r)).collect(),
            variadic: sig.variadic,
        }
    }

    fn field(&mut self, field: &AstField) -> FieldExpr {
        FieldExpr {
            name: field.name.clone(),
            embedded: field.embedded,
            tag: field.tag.clone(),
            ty: self.convert(&field.ty),
            pos: self.pos(field.line),
        }
    }

    /// The complete method set, sorted by name, with embedded interfaces
    /// expanded.
    fn method_set(&mut self, methods: &[AstMethod], owner: Option<&TypeExpr>) -> Vec<MethodExpr> {
        let mut set: BTreeMap<String, MethodExpr> = BTreeMap::new();
        for method in methods {
            match method {
                AstMethod::Method { name, sig, line } => {
                    let signature = self.signature(sig, owner.cloned());
                    let pos = self.pos(*line);
                    set.insert(
                        name.clone(),
                        MethodExpr {
                            name: name.clone(),
                            pos,
                            signature,
                        },
                    );
                }
                AstMethod::Embedded(ast) => {
                    let embedded = self.convert(ast);
                    for mut inherited in self.interface_methods(&embedded) {
                        // Named interfaces keep their own receiver.
                        if inherited.signature.receiver.is_none() {
                            inherited.signature.receiver = owner.cloned();
                        }
                        set.entry(inherited.name.clone()).or_insert(inherited);
                    }
                }
            }
        }
        set.into_values().collect()
    }

    fn interface_methods(&mut self, ty: &TypeExpr) -> Vec<MethodExpr> {
        match ty {
            TypeExpr::Interface(methods) => methods.clone(),
            TypeExpr::Named { package, name } if package.is_empty() && name == "error" => {
                match error_type().underlying {
                    TypeExpr::Interface(methods) => methods,
                    _ => Vec::new(),
                }
            }
            TypeExpr::Named { package, name } if package == self.package => {
                match self.types.get(name.as_str()).copied() {
                    Some(LocalType {
                        ast: Ast::Interface(methods),
                        file,
                        ..
                    }) => {
                        let declaring = TypeExpr::named(self.package, name);
                        self.in_file(file, |r| r.method_set(methods, Some(&declaring)))
                    }
                    _ => {
                        self.error(format!("{name} is not an interface"));
                        Vec::new()
                    }
                }
            }
            TypeExpr::Named { package, name } => {
                let imports = self.imports;
                let found = self
                    .files
                    .iter()
                    .flat_map(|f| f.names.values())
                    .filter_map(|literal| imports.get(literal))
                    .find(|p| &p.path == package)
                    .and_then(|p| p.named.get(name));
                match found.map(|def| &def.underlying) {
                    Some(TypeExpr::Interface(methods)) => methods.clone(),
                    _ => {
                        self.error(format!("{package}.{name} is not an interface"));
                        Vec::new()
                    }
                }
            }
            TypeExpr::Other(_) => Vec::new(),
            other => {
                self.error(format!("{other} is not an interface"));
                Vec::new()
            }
        }
    }
}

fn last_segment(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// The type a method is declared on: `T` for both `T` and `*T` receivers.
fn receiver_base(receiver: &Ast) -> Option<&str> {
    match receiver {
        Ast::Ident(name) => Some(name.as_str()),
        Ast::Pointer(inner) => match inner.as_ref() {
            Ast::Ident(name) => Some(name.as_str()),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn check_package(
    package: &str,
    files: &[ParsedFile<Unit>],
    imports: &dyn ImportedPackages,
) -> Result<CheckedPackage, OracleError> {
    let Some(first) = files.first() else {
        return Err(OracleError::Check {
            message: format!("no files for {package}"),
            partial: None,
        });
    };

    let mut errors = Vec::new();
    let mut scopes = Vec::with_capacity(files.len());
    for file in files {
        if file.package_name != first.package_name {
            errors.push(format!(
                "found packages {} and {} in {}",
                first.package_name, file.package_name, package
            ));
        }
        let mut names = HashMap::new();
        for import in &file.unit.imports {
            let imported = imports.get(&import.path);
            if imported.is_none() {
                errors.push(format!(
                    "{}: could not import {}",
                    file.path.display(),
                    import.path
                ));
            }
            let local = import
                .alias
                .clone()
                .or_else(|| imported.map(|p| p.name.clone()))
                .unwrap_or_else(|| last_segment(&import.path));
            names.insert(local, import.path.clone());
        }
        scopes.push(FileScope {
            path: &file.path,
            names,
        });
    }

    let mut types = BTreeMap::new();
    for (idx, file) in files.iter().enumerate() {
        for decl in &file.unit.decls {
            if let Decl::Type {
                name, ty, alias, ..
            } = decl
            {
                let local = LocalType {
                    ast: ty,
                    alias: *alias,
                    file: idx,
                };
                if types.insert(name.as_str(), local).is_some() {
                    errors.push(format!("{name} redeclared in this block"));
                }
            }
        }
    }

    let mut r = Resolver {
        package,
        imports,
        types,
        files: scopes,
        current: 0,
        errors,
    };
    let mut checked = CheckedPackage {
        path: package.to_string(),
        name: first.package_name.clone(),
        ..CheckedPackage::default()
    };

    for (idx, file) in files.iter().enumerate() {
        r.current = idx;
        for decl in &file.unit.decls {
            let object = match decl {
                Decl::Type {
                    name,
                    line,
                    ty,
                    alias,
                } => {
                    let ty = if *alias {
                        r.convert(ty)
                    } else {
                        TypeExpr::named(package, name.as_str())
                    };
                    Object::TypeName {
                        name: name.clone(),
                        pos: r.pos(*line),
                        ty,
                    }
                }
                Decl::Func {
                    name,
                    line,
                    receiver: None,
                    sig,
                } => Object::Func {
                    name: name.clone(),
                    pos: r.pos(*line),
                    signature: r.signature(sig, None),
                },
                // Methods are not package-scope objects.
                Decl::Func { .. } => continue,
                Decl::Var { name, line, ty } => Object::Var {
                    name: name.clone(),
                    pos: r.pos(*line),
                    ty: r.convert(ty),
                },
                Decl::Const {
                    name,
                    line,
                    ty,
                    untyped,
                } => Object::Const {
                    name: name.clone(),
                    pos: r.pos(*line),
                    ty: match ty {
                        Some(ty) => r.convert(ty),
                        None => TypeExpr::basic(*untyped),
                    },
                },
            };
            checked.objects.push(object);
        }
    }

    let defined: Vec<(&str, LocalType<'_>)> = r
        .types
        .iter()
        .filter(|(_, local)| !local.alias)
        .map(|(name, local)| (*name, *local))
        .collect();
    for (name, local) in defined {
        r.current = local.file;
        let owner = TypeExpr::named(package, name);
        let underlying = match local.ast {
            Ast::Interface(methods) => TypeExpr::Interface(r.method_set(methods, Some(&owner))),
            other => r.convert(other),
        };
        checked.named.insert(
            name.to_string(),
            NamedType {
                name: name.to_string(),
                underlying,
                methods: Vec::new(),
            },
        );
    }

    for (idx, file) in files.iter().enumerate() {
        r.current = idx;
        for decl in &file.unit.decls {
            let Decl::Func {
                name,
                line,
                receiver: Some(receiver),
                sig,
            } = decl
            else {
                continue;
            };
            let base = receiver_base(receiver);
            let Some(def) = base.filter(|b| r.types.get(b).is_some_and(|t| !t.alias)) else {
                r.error(format!("cannot define method {name} on {receiver:?}"));
                continue;
            };
            let def = def.to_string();
            let receiver = r.convert(receiver);
            let method = MethodExpr {
                name: name.clone(),
                pos: r.pos(*line),
                signature: r.signature(sig, Some(receiver)),
            };
            if let Some(named) = checked.named.get_mut(&def) {
                named.methods.push(method);
            }
        }
    }
    for named in checked.named.values_mut() {
        named.methods.sort_by(|a, b| a.name.cmp(&b.name));
    }

    if r.errors.is_empty() {
        Ok(checked)
    } else {
        Err(OracleError::Check {
            message: r.errors.join("; "),
            partial: Some(Box::new(checked)),
        })
    }
}
