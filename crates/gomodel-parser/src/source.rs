//! Source loading: parsed files per package, the comment table and the
//! import-edge set
//!
//! Comments are not linked to declarations. Every comment group is indexed by
//! the file and line it ends on, and documentation is found by asking for the
//! group that ends on the line right above a declaration.

use crate::paths::ImportPath;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source position. Only lines matter for comment association.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub file: PathBuf,
    pub line: u32,
}

impl Position {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// A run of comments with no blank line or code between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub start_line: u32,
    pub end_line: u32,
    /// Raw comment text, markers included, one entry per comment.
    pub comments: Vec<String>,
}

impl CommentGroup {
    /// The text of the group with comment markers, directives, leading and
    /// trailing blank lines removed and interior blank runs collapsed.
    pub fn text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        for comment in &self.comments {
            let body = if let Some(rest) = comment.strip_prefix("//") {
                if is_directive(rest) {
                    continue;
                }
                rest.strip_prefix(' ').unwrap_or(rest).to_string()
            } else if let Some(rest) = comment.strip_prefix("/*") {
                rest.strip_suffix("*/").unwrap_or(rest).to_string()
            } else {
                comment.clone()
            };
            lines.extend(body.split('\n').map(|l| l.trim_end().to_string()));
        }

        let mut out: Vec<String> = Vec::new();
        for line in lines {
            if line.is_empty() && out.last().map_or(true, |l: &String| l.is_empty()) {
                continue;
            }
            out.push(line);
        }
        while out.last().is_some_and(|l| l.is_empty()) {
            out.pop();
        }
        if out.is_empty() {
            return String::new();
        }
        let mut text = out.join("\n");
        text.push('\n');
        text
    }

    /// [`text`](Self::text) split into lines; empty when there is no text.
    pub fn text_lines(&self) -> Vec<String> {
        split_lines(&self.text())
    }
}

/// `//go:build`, `//line`, `//export` and friends are not documentation.
fn is_directive(rest: &str) -> bool {
    if rest.starts_with("line ") || rest.starts_with("extern ") || rest.starts_with("export ") {
        return true;
    }
    let Some((prefix, after)) = rest.split_once(':') else {
        return false;
    };
    !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

pub(crate) fn split_lines(text: &str) -> Vec<String> {
    let trimmed = text.trim_end_matches('\n');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\n').map(str::to_string).collect()
}

/// One parsed compilation unit as produced by a [`Frontend`](crate::Frontend).
#[derive(Debug, Clone)]
pub struct ParsedFile<U> {
    pub path: PathBuf,
    /// Name from the `package` clause.
    pub package_name: String,
    /// The package doc comment, if any.
    pub doc: Option<CommentGroup>,
    /// Every comment group in the file.
    pub comments: Vec<CommentGroup>,
    /// Import path literals, unquoted.
    pub imports: Vec<String>,
    /// The frontend's own representation, handed back for type checking.
    pub unit: U,
}

impl<U> ParsedFile<U> {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Looks up comment groups by position.
pub trait CommentLookup {
    /// The comment group ending `lines` lines above `pos`.
    fn prior_comment(&self, pos: &Position, lines: u32) -> Option<&CommentGroup>;
}

/// Parsed files, the comment table and the import graph of one run.
#[derive(Debug)]
pub struct SourceIndex<U> {
    parsed: BTreeMap<ImportPath, Vec<ParsedFile<U>>>,
    end_line_to_comment: HashMap<(PathBuf, u32), CommentGroup>,
    import_graph: BTreeMap<ImportPath, BTreeSet<String>>,
}

impl<U> Default for SourceIndex<U> {
    fn default() -> Self {
        Self {
            parsed: BTreeMap::new(),
            end_line_to_comment: HashMap::new(),
            import_graph: BTreeMap::new(),
        }
    }
}

impl<U> SourceIndex<U> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_file(&self, package: &ImportPath, path: &Path) -> bool {
        self.parsed
            .get(package)
            .is_some_and(|files| files.iter().any(|f| f.path == path))
    }

    /// Record a parsed file under `package`. A file already recorded for the
    /// package is left alone and `false` is returned.
    pub fn insert(&mut self, package: &ImportPath, file: ParsedFile<U>) -> bool {
        if self.contains_file(package, &file.path) {
            debug!("{} {} already parsed, skipping", package, file.path.display());
            return false;
        }

        for group in &file.comments {
            self.end_line_to_comment
                .insert((file.path.clone(), group.end_line), group.clone());
        }
        self.import_graph
            .entry(package.clone())
            .or_default()
            .extend(file.imports.iter().cloned());
        self.parsed.entry(package.clone()).or_default().push(file);
        true
    }

    pub fn has_package(&self, package: &ImportPath) -> bool {
        self.parsed.contains_key(package)
    }

    /// Packages with at least one parsed file, in path order.
    pub fn packages(&self) -> impl Iterator<Item = &ImportPath> {
        self.parsed.keys()
    }

    pub fn files(&self, package: &ImportPath) -> &[ParsedFile<U>] {
        self.parsed.get(package).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Import literals of `package` across all its files, deduplicated and
    /// sorted.
    pub fn imports(&self, package: &ImportPath) -> Vec<String> {
        self.import_graph
            .get(package)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn comment_ending_at(&self, file: &Path, line: u32) -> Option<&CommentGroup> {
        self.end_line_to_comment.get(&(file.to_path_buf(), line))
    }
}

impl<U> CommentLookup for SourceIndex<U> {
    fn prior_comment(&self, pos: &Position, lines: u32) -> Option<&CommentGroup> {
        let line = pos.line.checked_sub(lines)?;
        self.comment_ending_at(&pos.file, line)
    }
}
