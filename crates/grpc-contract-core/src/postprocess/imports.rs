//! Import resolution for generated Go files.
//!
//! Works like a small `goimports`: selector qualifiers (`common.Address`)
//! are matched against the file's import declarations and an
//! [`ImportTable`] of known packages. Unused imports are dropped, missing
//! ones added, and the result is rendered as a single grouped block.

use super::Finding;
use super::lexer::{KEYWORDS, Token, TokenKind};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Range;

/// Known Go packages by the qualifier generated code uses for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTable {
    entries: BTreeMap<String, String>,
}

impl ImportTable {
    /// An empty table; nothing will be added automatically.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Standard library and go-ethereum/gRPC packages used by generated servers.
    pub fn standard() -> Self {
        const STANDARD: &[(&str, &str)] = &[
            ("abi", "github.com/ethereum/go-ethereum/accounts/abi"),
            ("big", "math/big"),
            ("bind", "github.com/ethereum/go-ethereum/accounts/abi/bind"),
            ("bytes", "bytes"),
            ("codes", "google.golang.org/grpc/codes"),
            ("common", "github.com/ethereum/go-ethereum/common"),
            ("context", "context"),
            ("crypto", "github.com/ethereum/go-ethereum/crypto"),
            ("errors", "errors"),
            ("ethereum", "github.com/ethereum/go-ethereum"),
            ("event", "github.com/ethereum/go-ethereum/event"),
            ("fmt", "fmt"),
            ("grpc", "google.golang.org/grpc"),
            ("hexutil", "github.com/ethereum/go-ethereum/common/hexutil"),
            ("io", "io"),
            ("os", "os"),
            ("status", "google.golang.org/grpc/status"),
            ("strconv", "strconv"),
            ("strings", "strings"),
            ("sync", "sync"),
            ("time", "time"),
            ("types", "github.com/ethereum/go-ethereum/core/types"),
        ];

        let mut table = Self::new();
        for (qualifier, path) in STANDARD {
            table.insert(*qualifier, *path);
        }
        table
    }

    /// Map `qualifier` to `path`, returning the previous path if any.
    pub fn insert(&mut self, qualifier: impl Into<String>, path: impl Into<String>) -> Option<String> {
        self.entries.insert(qualifier.into(), path.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, qualifier: impl Into<String>, path: impl Into<String>) -> Self {
        self.insert(qualifier, path);
        self
    }

    pub fn resolve(&self, qualifier: &str) -> Option<&str> {
        self.entries.get(qualifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(q, p)| (q.as_str(), p.as_str()))
    }
}

impl Default for ImportTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl<Q: Into<String>, P: Into<String>> Extend<(Q, P)> for ImportTable {
    fn extend<I: IntoIterator<Item = (Q, P)>>(&mut self, iter: I) {
        for (qualifier, path) in iter {
            self.insert(qualifier, path);
        }
    }
}

/// One import spec: `alias "path"` or `"path"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportSpec {
    pub alias: Option<String>,
    pub path: String,
}

impl ImportSpec {
    /// Spec for `path` referenced as `qualifier`, aliased only when needed.
    fn for_qualifier(qualifier: &str, path: &str) -> Self {
        let alias = (assumed_name(path) != qualifier).then(|| qualifier.to_string());
        Self {
            alias,
            path: path.to_string(),
        }
    }

    /// Name the package is referenced by in the file.
    pub fn name(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| assumed_name(&self.path))
    }

    /// Blank and dot imports are kept regardless of usage.
    pub fn is_side_effect(&self) -> bool {
        matches!(self.alias.as_deref(), Some("_" | "."))
    }

    /// Standard library paths have no dot in their first segment.
    pub fn is_standard(&self) -> bool {
        let first = self.path.split('/').next().unwrap_or_default();
        !first.contains('.')
    }

    fn render(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{alias} \"{}\"", self.path),
            None => format!("\"{}\"", self.path),
        }
    }
}

/// Package name Go tooling assumes for an import path.
///
/// `github.com/ethereum/go-ethereum` → `ethereum`, `gopkg.in/yaml.v3` →
/// `yaml`, `example.com/mod/v2` → `mod`, `example.com/grpc-go` → `grpc`.
pub(crate) fn assumed_name(path: &str) -> String {
    let mut segments = path.rsplit('/');
    let mut base = segments.next().unwrap_or_default();
    if is_major_version(base) {
        if let Some(parent) = segments.next() {
            base = parent;
        }
    }
    let base = base.strip_prefix("go-").unwrap_or(base);
    base.chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// What the rewrite needs to know about a file's imports.
#[derive(Debug, Default)]
pub(crate) struct ImportPlan {
    /// Byte ranges of existing import declarations, to be removed.
    pub decls: Vec<Range<usize>>,
    /// Final import set, ordered by path.
    pub specs: Vec<ImportSpec>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ImportPlan {
    /// Render the final set as one declaration, standard library first.
    pub fn render_block(&self) -> Option<String> {
        let (standard, external): (Vec<&ImportSpec>, Vec<&ImportSpec>) =
            self.specs.iter().partition(|spec| spec.is_standard());

        match self.specs.len() {
            0 => None,
            1 => Some(format!("import {}", self.specs[0].render())),
            _ => {
                let mut block = String::from("import (\n");
                for spec in &standard {
                    block.push('\t');
                    block.push_str(&spec.render());
                    block.push('\n');
                }
                if !standard.is_empty() && !external.is_empty() {
                    block.push('\n');
                }
                for spec in &external {
                    block.push('\t');
                    block.push_str(&spec.render());
                    block.push('\n');
                }
                block.push(')');
                Some(block)
            }
        }
    }
}

/// Analyze the comment-free token stream `code` (starting at the package
/// clause) and decide the final import set.
pub(crate) fn plan(code: &[Token<'_>], table: &ImportTable) -> Result<ImportPlan, Finding> {
    let mut plan = ImportPlan::default();
    let mut existing: Vec<ImportSpec> = Vec::new();

    // Skip `package name`
    let mut idx = 2;
    loop {
        while code.get(idx).is_some_and(|t| t.is_punct(";")) {
            idx += 1;
        }
        match code.get(idx) {
            Some(tok) if tok.is_ident("import") => {
                let (range, specs) = parse_decl(code, &mut idx)?;
                plan.decls.push(range);
                for spec in specs {
                    if !existing.contains(&spec) {
                        existing.push(spec);
                    }
                }
            }
            _ => break,
        }
    }

    let body = &code[idx.min(code.len())..];
    let used = qualifiers(body);
    let declared = declared_names(body);

    let mut names: HashSet<String> = HashSet::new();
    for spec in existing {
        let name = spec.name();
        if spec.is_side_effect() || used.contains(name.as_str()) {
            names.insert(name);
            plan.specs.push(spec);
        } else {
            plan.removed.push(spec.path);
        }
    }

    for qualifier in used {
        if names.contains(qualifier) || declared.contains(&qualifier) {
            continue;
        }
        if let Some(path) = table.resolve(qualifier) {
            plan.added.push(path.to_string());
            plan.specs.push(ImportSpec::for_qualifier(qualifier, path));
            names.insert(qualifier.to_string());
        }
    }

    plan.specs
        .sort_by(|a, b| (&a.path, &a.alias).cmp(&(&b.path, &b.alias)));
    Ok(plan)
}

fn parse_decl(code: &[Token<'_>], idx: &mut usize) -> Result<(Range<usize>, Vec<ImportSpec>), Finding> {
    let keyword = code[*idx];
    *idx += 1;
    let mut specs = Vec::new();

    if code.get(*idx).is_some_and(|t| t.is_punct("(")) {
        *idx += 1;
        loop {
            match code.get(*idx) {
                Some(tok) if tok.is_punct(";") => *idx += 1,
                Some(tok) if tok.is_punct(")") => {
                    *idx += 1;
                    return Ok((keyword.start..tok.end, specs));
                }
                Some(_) => specs.push(parse_spec(code, idx, keyword.line)?),
                None => return Err(malformed_import(keyword.line)),
            }
        }
    }

    specs.push(parse_spec(code, idx, keyword.line)?);
    let end = code[*idx - 1].end;
    Ok((keyword.start..end, specs))
}

fn parse_spec(code: &[Token<'_>], idx: &mut usize, line: usize) -> Result<ImportSpec, Finding> {
    let mut alias = None;
    if let Some(tok) = code.get(*idx) {
        if tok.kind == TokenKind::Ident || tok.is_punct(".") {
            alias = Some(tok.text.to_string());
            *idx += 1;
        }
    }

    match code.get(*idx) {
        Some(tok) if matches!(tok.kind, TokenKind::String | TokenKind::RawString) => {
            *idx += 1;
            let path = &tok.text[1..tok.text.len() - 1];
            if path.is_empty() {
                return Err(malformed_import(tok.line));
            }
            Ok(ImportSpec {
                alias,
                path: path.to_string(),
            })
        }
        Some(tok) => Err(malformed_import(tok.line)),
        None => Err(malformed_import(line)),
    }
}

fn malformed_import(line: usize) -> Finding {
    Finding {
        reason: "malformed import declaration".to_string(),
        line,
    }
}

fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

/// Identifiers used as the left side of a selector that is not itself a
/// selector, e.g. `common` in `common.Address` but not `b` in `a.b.c`.
pub(crate) fn qualifiers<'a>(body: &[Token<'a>]) -> BTreeSet<&'a str> {
    let mut used = BTreeSet::new();
    for (i, tok) in body.iter().enumerate() {
        if tok.kind != TokenKind::Ident || is_keyword(tok.text) {
            continue;
        }
        let selector = body.get(i + 1).is_some_and(|t| t.is_punct("."))
            && body.get(i + 2).is_some_and(|t| t.kind == TokenKind::Ident);
        let chained = i > 0 && body[i - 1].is_punct(".");
        if selector && !chained {
            used.insert(tok.text);
        }
    }
    used
}

/// Names declared in the file that would shadow a package qualifier:
/// short variable declarations, `var`/`const`/`type` names, function names,
/// receivers, parameters and named results.
pub(crate) fn declared_names<'a>(body: &[Token<'a>]) -> HashSet<&'a str> {
    let mut declared = HashSet::new();

    for (i, tok) in body.iter().enumerate() {
        if tok.is_punct(":=") {
            let mut j = i;
            while j > 0 && body[j - 1].kind == TokenKind::Ident {
                declared.insert(body[j - 1].text);
                if j >= 2 && body[j - 2].is_punct(",") {
                    j -= 2;
                } else {
                    break;
                }
            }
        } else if tok.is_ident("var") || tok.is_ident("const") || tok.is_ident("type") {
            let mut j = i + 1;
            while let Some(name) = body.get(j).filter(|t| t.kind == TokenKind::Ident) {
                declared.insert(name.text);
                if body.get(j + 1).is_some_and(|t| t.is_punct(",")) {
                    j += 2;
                } else {
                    break;
                }
            }
        } else if tok.is_ident("func") {
            declare_signature(body, i + 1, &mut declared);
        }
    }

    declared
}

/// Walk the receiver, name, parameter and result groups after `func`.
fn declare_signature<'a>(body: &[Token<'a>], mut j: usize, declared: &mut HashSet<&'a str>) {
    let mut groups = 0;
    while groups < 3 {
        match body.get(j) {
            Some(tok) if tok.is_punct("(") => {
                let Some(close) = matching_paren(body, j) else {
                    return;
                };
                declare_params(&body[j + 1..close], declared);
                j = close + 1;
                groups += 1;
            }
            Some(tok)
                if tok.kind == TokenKind::Ident
                    && !is_keyword(tok.text)
                    && body.get(j + 1).is_some_and(|t| t.is_punct("(")) =>
            {
                declared.insert(tok.text);
                j += 1;
            }
            _ => return,
        }
    }
}

fn matching_paren(body: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, tok) in body[open..].iter().enumerate() {
        if tok.is_punct("(") {
            depth += 1;
        } else if tok.is_punct(")") {
            depth -= 1;
            if depth == 0 {
                return Some(open + offset);
            }
        }
    }
    None
}

/// Declare parameter names in one parenthesized group.
///
/// `a, b int` names both `a` and `b`; `int, error` names nothing.
fn declare_params<'a>(group: &[Token<'a>], declared: &mut HashSet<&'a str>) {
    let mut segments: Vec<&[Token<'a>]> = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, tok) in group.iter().enumerate() {
        if tok.is_opener() {
            depth += 1;
        } else if tok.is_closer() {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && tok.is_punct(",") {
            segments.push(&group[start..i]);
            start = i + 1;
        }
    }
    if start < group.len() {
        segments.push(&group[start..]);
    }

    let is_named = |segment: &[Token<'_>]| {
        segment.len() >= 2 && segment[0].kind == TokenKind::Ident && !segment[1].is_punct(".")
    };
    if !segments.iter().any(|s| is_named(*s)) {
        return;
    }
    for segment in segments {
        if let Some(first) = segment.first() {
            if first.kind == TokenKind::Ident && (segment.len() == 1 || is_named(segment)) {
                declared.insert(first.text);
            }
        }
    }
}
