//! Line-oriented parsing of the Go subset
//!
//! Declarations start at the beginning of a line. Struct and interface
//! bodies may span lines, one member per line; function bodies are skipped
//! by brace counting.

use gomodel_parser::{ChanDir, CommentGroup, ParsedFile};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Ident(String),
    Qualified(String, String),
    Pointer(Box<Ast>),
    Slice(Box<Ast>),
    Array(u64, Box<Ast>),
    Map(Box<Ast>, Box<Ast>),
    Chan(ChanDir, Box<Ast>),
    Func(AstSignature),
    Struct(Vec<AstField>),
    Interface(Vec<AstMethod>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AstSignature {
    pub params: Vec<Ast>,
    pub results: Vec<Ast>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstField {
    pub name: String,
    pub embedded: bool,
    pub tag: String,
    pub ty: Ast,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstMethod {
    Method {
        name: String,
        sig: AstSignature,
        line: u32,
    },
    Embedded(Ast),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Type {
        name: String,
        line: u32,
        ty: Ast,
        alias: bool,
    },
    Func {
        name: String,
        line: u32,
        receiver: Option<Ast>,
        sig: AstSignature,
    },
    Var {
        name: String,
        line: u32,
        ty: Ast,
    },
    Const {
        name: String,
        line: u32,
        ty: Option<Ast>,
        untyped: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub alias: Option<String>,
    pub path: String,
}

/// What [`MiniGo`](crate::MiniGo) keeps of a parsed file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unit {
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Int(u64),
    Str(String),
    Punct(&'static str),
}

const PUNCTS: &[&str] = &["...", "<-", "*", "[", "]", "(", ")", "{", "}", ",", ";", ".", "="];

fn tokenize(text: &str) -> Result<Vec<Tok>, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut toks = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            toks.push(Tok::Ident(chars[start..i].iter().collect()));
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let digits: String = chars[start..i].iter().collect();
            let n = digits.parse().map_err(|e| format!("bad number {digits}: {e}"))?;
            toks.push(Tok::Int(n));
        } else if c == '`' {
            let end = chars[i + 1..]
                .iter()
                .position(|&ch| ch == '`')
                .ok_or("unterminated raw string")?;
            toks.push(Tok::Str(chars[i + 1..i + 1 + end].iter().collect()));
            i += end + 2;
        } else if c == '"' {
            let mut value = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err("unterminated string".to_string()),
                    Some('"') => break,
                    Some('\\') => {
                        if let Some(&next) = chars.get(i + 1) {
                            value.push(next);
                        }
                        i += 2;
                    }
                    Some(&ch) => {
                        value.push(ch);
                        i += 1;
                    }
                }
            }
            toks.push(Tok::Str(value));
            i += 1;
        } else {
            let rest: String = chars[i..].iter().take(3).collect();
            let punct = PUNCTS
                .iter()
                .find(|p| rest.starts_with(**p))
                .ok_or_else(|| format!("unexpected character {c:?}"))?;
            toks.push(Tok::Punct(*punct));
            i += punct.len();
        }
    }
    Ok(toks)
}

struct TypeParser {
    toks: Vec<Tok>,
    pos: usize,
    line: u32,
}

impl TypeParser {
    fn new(text: &str, line: u32) -> Result<Self, String> {
        Ok(Self {
            toks: tokenize(text)?,
            pos: 0,
            line,
        })
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.toks.get(self.pos + offset)
    }

    fn is_punct(&self, punct: &str) -> bool {
        matches!(self.peek(), Some(Tok::Punct(p)) if *p == punct)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, punct: &str) -> Result<(), String> {
        match self.next() {
            Some(Tok::Punct(p)) if p == punct => Ok(()),
            other => Err(format!("expected {punct:?}, found {other:?}")),
        }
    }

    fn ident(&mut self) -> Result<String, String> {
        match self.next() {
            Some(Tok::Ident(id)) => Ok(id),
            other => Err(format!("expected identifier, found {other:?}")),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn finish(&self) -> Result<(), String> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(format!("unexpected {tok:?}")),
        }
    }

    fn starts_type(&self) -> bool {
        match self.peek() {
            Some(Tok::Ident(_)) => true,
            Some(Tok::Punct(p)) => matches!(*p, "*" | "[" | "(" | "<-"),
            _ => false,
        }
    }

    fn parse_type(&mut self) -> Result<Ast, String> {
        match self.next() {
            Some(Tok::Punct("*")) => Ok(Ast::Pointer(Box::new(self.parse_type()?))),
            Some(Tok::Punct("[")) => match self.next() {
                Some(Tok::Punct("]")) => Ok(Ast::Slice(Box::new(self.parse_type()?))),
                Some(Tok::Int(len)) => {
                    self.expect("]")?;
                    Ok(Ast::Array(len, Box::new(self.parse_type()?)))
                }
                other => Err(format!("expected array length, found {other:?}")),
            },
            Some(Tok::Punct("(")) => {
                let inner = self.parse_type()?;
                self.expect(")")?;
                Ok(inner)
            }
            Some(Tok::Punct("<-")) => match self.ident()?.as_str() {
                "chan" => Ok(Ast::Chan(ChanDir::Recv, Box::new(self.parse_type()?))),
                other => Err(format!("expected chan, found {other}")),
            },
            Some(Tok::Ident(id)) => match id.as_str() {
                "map" => {
                    self.expect("[")?;
                    let key = self.parse_type()?;
                    self.expect("]")?;
                    let elem = self.parse_type()?;
                    Ok(Ast::Map(Box::new(key), Box::new(elem)))
                }
                "chan" => {
                    let dir = if self.is_punct("<-") {
                        self.next();
                        ChanDir::Send
                    } else {
                        ChanDir::Both
                    };
                    Ok(Ast::Chan(dir, Box::new(self.parse_type()?)))
                }
                "func" => Ok(Ast::Func(self.parse_signature()?)),
                "struct" => {
                    self.expect("{")?;
                    Ok(Ast::Struct(self.parse_fields()?))
                }
                "interface" => {
                    self.expect("{")?;
                    Ok(Ast::Interface(self.parse_methods()?))
                }
                _ if self.is_punct(".") => {
                    self.next();
                    Ok(Ast::Qualified(id, self.ident()?))
                }
                _ => Ok(Ast::Ident(id)),
            },
            other => Err(format!("expected type, found {other:?}")),
        }
    }

    fn parse_signature(&mut self) -> Result<AstSignature, String> {
        self.expect("(")?;
        let (params, variadic) = self.parse_params()?;
        let results = if self.is_punct("(") {
            self.next();
            self.parse_params()?.0
        } else if self.starts_type() {
            vec![self.parse_type()?]
        } else {
            Vec::new()
        };
        Ok(AstSignature {
            params,
            results,
            variadic,
        })
    }

    /// Parameters up to and including the closing paren. `a, b int` shares
    /// the type across names.
    fn parse_params(&mut self) -> Result<(Vec<Ast>, bool), String> {
        // (name, type, variadic); a bare entry has no name yet.
        let mut entries: Vec<(Option<String>, Ast, bool)> = Vec::new();
        loop {
            if self.is_punct(")") {
                self.next();
                break;
            }
            let named = match (self.peek(), self.peek_at(1)) {
                (Some(Tok::Ident(id)), Some(next)) => {
                    !is_type_keyword(id)
                        && !matches!(next, Tok::Punct("." | "," | ")"))
                }
                _ => false,
            };
            let name = if named { Some(self.ident()?) } else { None };
            let variadic = if self.is_punct("...") {
                self.next();
                true
            } else {
                false
            };
            let ty = self.parse_type()?;
            entries.push((name, ty, variadic));
            if self.is_punct(",") {
                self.next();
            } else if !self.is_punct(")") {
                return Err(format!("expected , or ) in parameters, found {:?}", self.peek()));
            }
        }

        let any_named = entries.iter().any(|(name, _, _)| name.is_some());
        let mut types = Vec::with_capacity(entries.len());
        let mut variadic = false;
        let mut pending = 0;
        for (name, ty, dots) in entries {
            if any_named && name.is_none() {
                // A bare identifier in a named list is a name waiting for
                // the next type.
                pending += 1;
                continue;
            }
            let ty = if dots { Ast::Slice(Box::new(ty)) } else { ty };
            for _ in 0..pending {
                types.push(ty.clone());
            }
            pending = 0;
            types.push(ty);
            variadic = dots;
        }
        if pending > 0 {
            return Err("missing parameter type".to_string());
        }
        Ok((types, variadic))
    }

    /// Fields of an inline struct, through the closing brace.
    fn parse_fields(&mut self) -> Result<Vec<AstField>, String> {
        let mut fields = Vec::new();
        loop {
            if self.is_punct(";") {
                self.next();
                continue;
            }
            if self.is_punct("}") {
                self.next();
                return Ok(fields);
            }
            if self.at_end() {
                return Err("unterminated struct".to_string());
            }
            fields.extend(self.parse_field()?);
        }
    }

    fn parse_field(&mut self) -> Result<Vec<AstField>, String> {
        let line = self.line;
        if self.is_punct("*") {
            self.next();
            let ty = self.parse_type()?;
            let name = base_name(&ty);
            let tag = self.tag();
            return Ok(vec![AstField {
                name,
                embedded: true,
                tag,
                ty: Ast::Pointer(Box::new(ty)),
                line,
            }]);
        }

        let first = self.ident()?;
        let embedded = |ty: Ast, tag: String| AstField {
            name: base_name(&ty),
            embedded: true,
            tag,
            ty,
            line,
        };
        match self.peek() {
            Some(Tok::Punct(".")) => {
                self.next();
                let ty = Ast::Qualified(first, self.ident()?);
                let tag = self.tag();
                Ok(vec![embedded(ty, tag)])
            }
            None | Some(Tok::Punct(";" | "}")) | Some(Tok::Str(_)) => {
                let tag = self.tag();
                Ok(vec![embedded(Ast::Ident(first), tag)])
            }
            _ => {
                let mut names = vec![first];
                while self.is_punct(",") {
                    self.next();
                    names.push(self.ident()?);
                }
                let ty = self.parse_type()?;
                let tag = self.tag();
                Ok(names
                    .into_iter()
                    .map(|name| AstField {
                        name,
                        embedded: false,
                        tag: tag.clone(),
                        ty: ty.clone(),
                        line,
                    })
                    .collect())
            }
        }
    }

    fn tag(&mut self) -> String {
        match self.peek() {
            Some(Tok::Str(s)) => {
                let s = s.clone();
                self.next();
                s
            }
            _ => String::new(),
        }
    }

    /// Methods of an inline interface, through the closing brace.
    fn parse_methods(&mut self) -> Result<Vec<AstMethod>, String> {
        let mut methods = Vec::new();
        loop {
            if self.is_punct(";") {
                self.next();
                continue;
            }
            if self.is_punct("}") {
                self.next();
                return Ok(methods);
            }
            if self.at_end() {
                return Err("unterminated interface".to_string());
            }
            methods.push(self.parse_method()?);
        }
    }

    fn parse_method(&mut self) -> Result<AstMethod, String> {
        let line = self.line;
        let name = self.ident()?;
        if self.is_punct("(") {
            let sig = self.parse_signature()?;
            return Ok(AstMethod::Method { name, sig, line });
        }
        if self.is_punct(".") {
            self.next();
            return Ok(AstMethod::Embedded(Ast::Qualified(name, self.ident()?)));
        }
        Ok(AstMethod::Embedded(Ast::Ident(name)))
    }
}

fn is_type_keyword(id: &str) -> bool {
    matches!(id, "map" | "chan" | "func" | "struct" | "interface")
}

/// Name of the type an embedded field refers to.
fn base_name(ty: &Ast) -> String {
    match ty {
        Ast::Ident(name) | Ast::Qualified(_, name) => name.clone(),
        Ast::Pointer(inner) => base_name(inner),
        _ => String::new(),
    }
}

/// Drop a trailing `//` comment, ignoring `//` inside literals.
fn strip_trailing_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == b'\\' && q != b'`' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'`' || b == b'\'' => quote = Some(b),
            None if b == b'/' && bytes.get(i + 1) == Some(&b'/') => return line[..i].trim_end(),
            None => {}
        }
        i += 1;
    }
    line.trim_end()
}

/// Net `{` minus `}` outside literals.
fn brace_balance(text: &str) -> i32 {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut balance = 0;
    for c in text.chars() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(q) if c == '\\' && q != '`' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '`' || c == '\'' => quote = Some(c),
            None if c == '{' => balance += 1,
            None if c == '}' => balance -= 1,
            None => {}
        }
    }
    balance
}

/// Split `func` header text from its body: the first `{` outside parens
/// that does not open a `struct` or `interface` literal.
fn split_body(text: &str) -> (&str, &str) {
    let mut depth = 0i32;
    let mut literal_depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '{' if literal_depth > 0 => literal_depth += 1,
            '}' if literal_depth > 0 => literal_depth -= 1,
            '{' if depth == 0 => {
                let before = text[..i].trim_end();
                if before.ends_with("struct") || before.ends_with("interface") {
                    literal_depth = 1;
                } else {
                    return (text[..i].trim_end(), &text[i..]);
                }
            }
            '{' => {
                literal_depth = 1;
            }
            _ => {}
        }
    }
    (text.trim_end(), "")
}

fn comment_groups(lines: &[&str]) -> Vec<CommentGroup> {
    let mut groups = Vec::new();
    let mut current: Option<CommentGroup> = None;
    for (idx, raw) in lines.iter().enumerate() {
        let line = idx as u32 + 1;
        let trimmed = raw.trim();
        let is_comment = trimmed.starts_with("//")
            || (trimmed.starts_with("/*") && trimmed.ends_with("*/"));
        if is_comment {
            match current.as_mut() {
                Some(group) => {
                    group.end_line = line;
                    group.comments.push(trimmed.to_string());
                }
                None => {
                    current = Some(CommentGroup {
                        start_line: line,
                        end_line: line,
                        comments: vec![trimmed.to_string()],
                    })
                }
            }
        } else if let Some(group) = current.take() {
            groups.push(group);
        }
    }
    groups.extend(current);
    groups
}

/// Parse a file of the subset.
pub fn parse_file(path: &Path, src: &str) -> Result<ParsedFile<Unit>, String> {
    let lines: Vec<&str> = src.lines().collect();
    let comments = comment_groups(&lines);
    let mut parser = FileParser {
        lines: &lines,
        idx: 0,
        package_name: None,
        unit: Unit::default(),
    };
    let package_line = parser
        .run()
        .map_err(|e| format!("{}:{}: {}", path.display(), parser.idx + 1, e))?;

    let package_name = parser
        .package_name
        .ok_or_else(|| format!("{}: missing package clause", path.display()))?;
    let doc = package_line
        .checked_sub(1)
        .and_then(|end| comments.iter().find(|g| g.end_line == end))
        .cloned();
    let imports = parser.unit.imports.iter().map(|i| i.path.clone()).collect();
    Ok(ParsedFile {
        path: path.to_path_buf(),
        package_name,
        doc,
        comments,
        imports,
        unit: parser.unit,
    })
}

struct FileParser<'a> {
    lines: &'a [&'a str],
    idx: usize,
    package_name: Option<String>,
    unit: Unit,
}

impl FileParser<'_> {
    fn line_no(&self) -> u32 {
        self.idx as u32 + 1
    }

    /// Parse every line; returns the line of the package clause.
    fn run(&mut self) -> Result<u32, String> {
        let mut package_line = 0;
        while self.idx < self.lines.len() {
            let text = strip_trailing_comment(self.lines[self.idx]).trim().to_string();
            if text.is_empty() || text.starts_with("//") || text.starts_with("/*") {
                self.idx += 1;
                continue;
            }
            let (keyword, rest) = text.split_once(' ').unwrap_or((text.as_str(), ""));
            let rest = rest.trim();
            match keyword {
                "package" => {
                    self.package_name = Some(rest.to_string());
                    package_line = self.line_no();
                }
                _ if self.package_name.is_none() => {
                    return Err("expected package clause".to_string());
                }
                "import" => self.import(rest)?,
                "type" => self.type_decl(rest)?,
                "func" => self.func_decl(rest)?,
                "var" => self.var_spec(rest)?,
                "const" => self.const_spec(rest)?,
                other => return Err(format!("unexpected {other:?}")),
            }
            self.idx += 1;
        }
        Ok(package_line)
    }

    fn import(&mut self, rest: &str) -> Result<(), String> {
        if rest == "(" {
            let lines = self.lines;
            loop {
                self.idx += 1;
                let Some(&line) = lines.get(self.idx) else {
                    return Err("unterminated import block".to_string());
                };
                let spec = strip_trailing_comment(line).trim();
                match spec {
                    ")" => return Ok(()),
                    "" => {}
                    _ if spec.starts_with("//") => {}
                    _ => self.import_spec(spec)?,
                }
            }
        }
        self.import_spec(rest)
    }

    fn import_spec(&mut self, spec: &str) -> Result<(), String> {
        let toks = tokenize(spec)?;
        let import = match toks.as_slice() {
            [Tok::Str(path)] => Import {
                alias: None,
                path: path.clone(),
            },
            [Tok::Ident(alias), Tok::Str(path)] => Import {
                alias: Some(alias.clone()),
                path: path.clone(),
            },
            _ => return Err(format!("bad import {spec:?}")),
        };
        self.unit.imports.push(import);
        Ok(())
    }

    fn type_decl(&mut self, rest: &str) -> Result<(), String> {
        let line = self.line_no();
        let (name, expr) = rest
            .split_once(' ')
            .ok_or_else(|| format!("bad type declaration {rest:?}"))?;
        let expr = expr.trim();
        let (alias, expr) = match expr.strip_prefix('=') {
            Some(target) => (true, target.trim()),
            None => (false, expr),
        };

        let ty = if brace_balance(expr) > 0 {
            self.multiline_type(expr, line)?
        } else {
            let mut parser = TypeParser::new(expr, line)?;
            let ty = parser.parse_type()?;
            parser.finish()?;
            ty
        };
        self.unit.decls.push(Decl::Type {
            name: name.to_string(),
            line,
            ty,
            alias,
        });
        Ok(())
    }

    /// A struct or interface whose body continues on the following lines.
    fn multiline_type(&mut self, header: &str, line: u32) -> Result<Ast, String> {
        let header = header.trim_end_matches('{').trim();
        let is_struct = match header {
            "struct" => true,
            "interface" => false,
            other => return Err(format!("unsupported multi-line type {other:?}")),
        };

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        loop {
            self.idx += 1;
            let Some(raw) = self.lines.get(self.idx) else {
                return Err(format!("unterminated body of type at line {line}"));
            };
            let member_line = self.line_no();
            let mut text = strip_trailing_comment(raw).trim().to_string();
            if text == "}" {
                break;
            }
            if text.is_empty() || text.starts_with("//") {
                continue;
            }
            // A nested literal spanning lines is folded into one member.
            let mut balance = brace_balance(&text);
            while balance > 0 {
                self.idx += 1;
                let Some(more) = self.lines.get(self.idx) else {
                    return Err(format!("unterminated member at line {member_line}"));
                };
                let more = strip_trailing_comment(more).trim();
                balance += brace_balance(more);
                text.push_str("; ");
                text.push_str(more);
            }

            let mut parser = TypeParser::new(&text, member_line)?;
            if is_struct {
                fields.extend(parser.parse_field()?);
            } else {
                methods.push(parser.parse_method()?);
            }
            parser.finish()?;
        }

        Ok(if is_struct {
            Ast::Struct(fields)
        } else {
            Ast::Interface(methods)
        })
    }

    fn func_decl(&mut self, rest: &str) -> Result<(), String> {
        let line = self.line_no();
        let (header, body) = split_body(rest);
        let mut balance = brace_balance(body);
        while balance > 0 {
            self.idx += 1;
            let Some(more) = self.lines.get(self.idx) else {
                return Err(format!("unterminated body of func at line {line}"));
            };
            balance += brace_balance(strip_trailing_comment(more));
        }

        let mut parser = TypeParser::new(header, line)?;
        let receiver = if parser.is_punct("(") {
            parser.next();
            // `(p *Point)` names the receiver, `(Point)` does not.
            let named = matches!(parser.peek(), Some(Tok::Ident(_)))
                && !matches!(parser.peek_at(1), Some(Tok::Punct(")" | ".")));
            if named {
                parser.next();
            }
            let recv = parser.parse_type()?;
            parser.expect(")")?;
            Some(recv)
        } else {
            None
        };
        let name = parser.ident()?;
        let sig = parser.parse_signature()?;
        parser.finish()?;
        self.unit.decls.push(Decl::Func {
            name,
            line,
            receiver,
            sig,
        });
        Ok(())
    }

    /// `Name Type [= value]`; the type is required.
    fn var_spec(&mut self, text: &str) -> Result<(), String> {
        let line = self.line_no();
        let lhs = text.split_once('=').map_or(text, |(lhs, _)| lhs.trim());
        let (name, ty) = lhs
            .split_once(' ')
            .ok_or_else(|| format!("var {lhs} has no type"))?;
        let ty = Self::single_type(ty, line)?;
        self.unit.decls.push(Decl::Var {
            name: name.to_string(),
            line,
            ty,
        });
        Ok(())
    }

    /// `Name [Type] = value`.
    fn const_spec(&mut self, text: &str) -> Result<(), String> {
        let line = self.line_no();
        let (lhs, value) = text
            .split_once('=')
            .ok_or_else(|| format!("const {text} has no value"))?;
        let (name, ty) = match lhs.trim().split_once(' ') {
            Some((name, ty)) => (name, Some(Self::single_type(ty, line)?)),
            None => (lhs.trim(), None),
        };
        self.unit.decls.push(Decl::Const {
            name: name.to_string(),
            line,
            ty,
            untyped: untyped_kind(value.trim()),
        });
        Ok(())
    }

    fn single_type(text: &str, line: u32) -> Result<Ast, String> {
        let mut parser = TypeParser::new(text, line)?;
        let ty = parser.parse_type()?;
        parser.finish()?;
        Ok(ty)
    }
}

fn untyped_kind(value: &str) -> &'static str {
    if value.starts_with('"') || value.starts_with('`') {
        "untyped string"
    } else if value == "true" || value == "false" {
        "untyped bool"
    } else if value.chars().next().is_some_and(|c| c.is_ascii_digit()) && value.contains('.') {
        "untyped float"
    } else {
        "untyped int"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ident(name: &str) -> Ast {
        Ast::Ident(name.to_string())
    }

    fn parse_type(text: &str) -> Ast {
        let mut parser = TypeParser::new(text, 1).unwrap();
        let ty = parser.parse_type().unwrap();
        parser.finish().unwrap();
        ty
    }

    #[test]
    fn test_type_expressions() {
        assert_eq!(
            parse_type("map[string][]*pkg.T"),
            Ast::Map(
                Box::new(ident("string")),
                Box::new(Ast::Slice(Box::new(Ast::Pointer(Box::new(Ast::Qualified(
                    "pkg".into(),
                    "T".into()
                ))))))
            )
        );
        assert_eq!(
            parse_type("<-chan [4]int"),
            Ast::Chan(ChanDir::Recv, Box::new(Ast::Array(4, Box::new(ident("int")))))
        );
        assert_eq!(
            parse_type("chan<- int"),
            Ast::Chan(ChanDir::Send, Box::new(ident("int")))
        );
    }

    #[test]
    fn test_parameter_grouping() {
        let Ast::Func(sig) = parse_type("func(a, b int, rest ...string) (n int, err error)") else {
            panic!("expected func");
        };
        assert_eq!(
            sig.params,
            vec![
                ident("int"),
                ident("int"),
                Ast::Slice(Box::new(ident("string")))
            ]
        );
        assert!(sig.variadic);
        assert_eq!(sig.results, vec![ident("int"), ident("error")]);

        let Ast::Func(sig) = parse_type("func(int, pkg.T) error") else {
            panic!("expected func");
        };
        assert_eq!(sig.params.len(), 2);
        assert!(!sig.variadic);
        assert_eq!(sig.results, vec![ident("error")]);
    }

    #[test]
    fn test_inline_struct_fields() {
        let Ast::Struct(fields) = parse_type("struct{ X, Y int `json:\"xy\"`; *Base; pkg.Mixin }") else {
            panic!("expected struct");
        };
        let names: Vec<(&str, bool)> = fields.iter().map(|f| (f.name.as_str(), f.embedded)).collect();
        assert_eq!(
            names,
            vec![("X", false), ("Y", false), ("Base", true), ("Mixin", true)]
        );
        assert_eq!(fields[0].tag, "json:\"xy\"");
    }

    #[test]
    fn test_file_layout() {
        let src = "\
// Package shapes does geometry.
package shapes

import (
\t\"example.com/units\"
\tm \"example.com/math\"
)

// Point is a point.
type Point struct {
\t// X is horizontal.
\tX int `json:\"x\"`
\tY int // trailing
\tMeta struct {
\t\tTag string
\t}
}

func (p *Point) Dist() float64 {
\tif p == nil {
\t\treturn 0
\t}
\treturn 1
}

func New(x, y int) *Point { return &Point{X: x, Y: y} }

var Origin Point

const A = iota

const Name string = \"n\"
";
        let file = parse_file(Path::new("/src/shapes/point.go"), src).unwrap();
        assert_eq!(file.package_name, "shapes");
        assert_eq!(file.doc.as_ref().map(|d| d.start_line), Some(1));
        assert_eq!(file.imports, vec!["example.com/units", "example.com/math"]);
        assert_eq!(file.unit.imports[1].alias.as_deref(), Some("m"));

        let names: Vec<String> = file
            .unit
            .decls
            .iter()
            .map(|d| match d {
                Decl::Type { name, line, .. }
                | Decl::Func { name, line, .. }
                | Decl::Var { name, line, .. }
                | Decl::Const { name, line, .. } => format!("{name}@{line}"),
            })
            .collect();
        assert_eq!(
            names,
            vec!["Point@10", "Dist@19", "New@26", "Origin@28", "A@30", "Name@32"]
        );

        let Decl::Type { ty: Ast::Struct(fields), .. } = &file.unit.decls[0] else {
            panic!("expected struct");
        };
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].line, 12);
        assert!(matches!(fields[2].ty, Ast::Struct(_)));

        let Decl::Const { untyped, ty, .. } = &file.unit.decls[4] else {
            panic!("expected const");
        };
        assert_eq!(*untyped, "untyped int");
        assert!(ty.is_none());

        // Comment groups: package doc, type doc, field doc, trailing.
        let ends: Vec<u32> = file.comments.iter().map(|g| g.end_line).collect();
        assert_eq!(ends, vec![1, 9, 11]);
    }

    #[test]
    fn test_malformed_sources() {
        assert!(parse_file(Path::new("a.go"), "type X int\n").is_err());
        assert!(parse_file(Path::new("a.go"), "package a\ntype X struct {\n\tA int\n").is_err());
        assert!(parse_file(Path::new("a.go"), "package a\ntype X map[\n").is_err());
        assert!(parse_file(Path::new("a.go"), "package a\nwhile true\n").is_err());
        assert!(parse_file(Path::new("a.go"), "package a\nvar X = 1\n").is_err());
    }
}
