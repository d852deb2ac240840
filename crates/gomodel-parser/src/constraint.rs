//! Build constraints (`//go:build` and legacy `// +build` lines)

use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed build constraint {line:?}: {reason}")]
pub struct ConstraintError {
    pub line: String,
    pub reason: String,
}

/// A boolean expression over build tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Tag(String),
    Not(Box<Constraint>),
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
}

impl Constraint {
    pub fn eval(&self, tags: &BTreeSet<String>) -> bool {
        match self {
            Constraint::Tag(tag) => tags.contains(tag),
            Constraint::Not(inner) => !inner.eval(tags),
            Constraint::And(a, b) => a.eval(tags) && b.eval(tags),
            Constraint::Or(a, b) => a.eval(tags) || b.eval(tags),
        }
    }

    /// Parse the expression of a `//go:build` line.
    pub fn parse_go_build(expr: &str) -> Result<Self, ConstraintError> {
        let tokens = tokenize(expr).map_err(|reason| ConstraintError {
            line: expr.to_string(),
            reason,
        })?;
        let mut parser = ExprParser { tokens, pos: 0 };
        let result = parser
            .or_expr()
            .and_then(|c| match parser.tokens.get(parser.pos) {
                None => Ok(c),
                Some(t) => Err(format!("unexpected token {t:?}")),
            });
        result.map_err(|reason| ConstraintError {
            line: expr.to_string(),
            reason,
        })
    }

    /// Parse the body of a legacy `// +build` line: space-separated terms are
    /// OR-ed, comma-separated factors AND-ed, `!` negates.
    pub fn parse_plus_build(body: &str) -> Result<Self, ConstraintError> {
        let malformed = |reason: &str| ConstraintError {
            line: body.to_string(),
            reason: reason.to_string(),
        };
        let mut any: Option<Constraint> = None;
        for term in body.split_whitespace() {
            let mut all: Option<Constraint> = None;
            for factor in term.split(',') {
                let (negated, tag) = match factor.strip_prefix('!') {
                    Some(rest) => (true, rest),
                    None => (false, factor),
                };
                if tag.is_empty() || !tag.chars().all(is_tag_char) {
                    return Err(malformed("invalid tag"));
                }
                let mut c = Constraint::Tag(tag.to_string());
                if negated {
                    c = Constraint::Not(Box::new(c));
                }
                all = Some(match all {
                    Some(prev) => Constraint::And(Box::new(prev), Box::new(c)),
                    None => c,
                });
            }
            if let Some(all) = all {
                any = Some(match any {
                    Some(prev) => Constraint::Or(Box::new(prev), Box::new(all)),
                    None => all,
                });
            }
        }
        any.ok_or_else(|| malformed("empty constraint"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Not,
    And,
    Or,
    Ident(String),
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '!' => tokens.push(Token::Not),
            '&' | '|' => {
                if chars.next().map(|(_, n)| n) != Some(c) {
                    return Err(format!("expected {c}{c} at offset {i}"));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            c if is_tag_char(c) => {
                let mut ident = String::from(c);
                while let Some(&(_, n)) = chars.peek() {
                    if !is_tag_char(n) {
                        break;
                    }
                    ident.push(n);
                    chars.next();
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(format!("unexpected character {other:?} at offset {i}")),
        }
    }
    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn or_expr(&mut self) -> Result<Constraint, String> {
        let mut left = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and_expr()?;
            left = Constraint::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Constraint, String> {
        let mut left = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.unary()?;
            left = Constraint::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Constraint, String> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        match token {
            Some(Token::Not) => Ok(Constraint::Not(Box::new(self.unary()?))),
            Some(Token::LParen) => {
                let inner = self.or_expr()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err("missing )".to_string());
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(Token::Ident(tag)) => Ok(Constraint::Tag(tag)),
            Some(other) => Err(format!("unexpected token {other:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

/// The constraint governing a source file, read from the comment lines
/// before its `package` clause. A `//go:build` line takes precedence over
/// `// +build` lines, which are AND-ed together.
pub fn file_constraint(src: &str) -> Option<Result<Constraint, ConstraintError>> {
    let mut plus_build: Vec<Result<Constraint, ConstraintError>> = Vec::new();
    for line in src.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !line.starts_with("//") {
            break;
        }
        if let Some(expr) = line.strip_prefix("//go:build") {
            return Some(Constraint::parse_go_build(expr.trim()));
        }
        if let Some(body) = line.strip_prefix("// +build") {
            plus_build.push(Constraint::parse_plus_build(body.trim()));
        }
    }

    let mut combined: Option<Constraint> = None;
    for c in plus_build {
        let c = match c {
            Ok(c) => c,
            Err(e) => return Some(Err(e)),
        };
        combined = Some(match combined {
            Some(prev) => Constraint::And(Box::new(prev), Box::new(c)),
            None => c,
        });
    }
    combined.map(Ok)
}

/// Tags satisfied on every run: the host platform and the toolchain name, in
/// the spelling Go uses.
pub fn default_tags() -> BTreeSet<String> {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    };
    let mut tags: BTreeSet<String> = [os, arch, "gc"].iter().map(|s| s.to_string()).collect();
    if cfg!(unix) {
        tags.insert("unix".to_string());
    }
    tags
}
