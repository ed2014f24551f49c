//! Post-processing of rendered Go source.
//!
//! Rendered templates are rarely canonical: imports are missing or unused,
//! semicolons linger and indentation follows the template. [`PostProcessor`]
//! validates the text, fixes the import set, and lays the file out the way
//! `goimports` would. Text that cannot be treated as Go source is rejected
//! with [`GenerateError::MalformedSource`].
//!
//! ```
//! use grpc_contract_core::postprocess;
//!
//! let raw = b"package demo;\nfunc Now() time.Time { return time.Now() }\n";
//! let out = String::from_utf8(postprocess(raw)?).unwrap();
//!
//! assert_eq!(out, "package demo\n\nimport \"time\"\n\nfunc Now() time.Time { return time.Now() }\n");
//! # Ok::<(), grpc_contract_core::GenerateError>(())
//! ```

mod imports;
mod layout;
mod lexer;

pub use imports::ImportTable;

use crate::error::{GenerateError, GenerateResult};
use imports::ImportPlan;
use lexer::{KEYWORDS, LexError, Token, TokenKind, tokenize};
use std::ops::Range;

/// Longest excerpt quoted in a [`GenerateError::MalformedSource`].
const EXCERPT_LIMIT: usize = 80;

/// A problem found in the source, before it is tied to the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Finding {
    pub reason: String,
    pub line: usize,
}

impl From<LexError> for Finding {
    fn from(err: LexError) -> Self {
        Self {
            reason: err.reason,
            line: err.line,
        }
    }
}

/// Turns rendered Go source into canonical Go source.
#[derive(Debug, Clone, Default)]
pub struct PostProcessor {
    imports: ImportTable,
}

impl PostProcessor {
    /// A post-processor resolving qualifiers against [`ImportTable::standard`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_imports(imports: ImportTable) -> Self {
        Self { imports }
    }

    pub fn imports(&self) -> &ImportTable {
        &self.imports
    }

    /// Validate, fix imports, and lay out `raw`.
    pub fn process(&self, raw: &[u8]) -> GenerateResult<Vec<u8>> {
        let src = std::str::from_utf8(raw).map_err(|e| {
            let line = raw[..e.valid_up_to()].iter().filter(|b| **b == b'\n').count() + 1;
            let lossy = String::from_utf8_lossy(raw);
            malformed(
                &lossy,
                Finding {
                    reason: "source is not valid UTF-8".to_string(),
                    line,
                },
            )
        })?;

        self.process_str(src)
            .map(String::into_bytes)
            .map_err(|finding| malformed(src, finding))
    }

    fn process_str(&self, src: &str) -> Result<String, Finding> {
        let tokens = tokenize(src)?;
        validate(&tokens)?;

        let code: Vec<Token<'_>> = tokens.iter().copied().filter(|t| !t.is_comment()).collect();
        let plan = imports::plan(&code, &self.imports)?;
        if !plan.added.is_empty() || !plan.removed.is_empty() {
            tracing::debug!(added = ?plan.added, removed = ?plan.removed, "adjusted imports");
        }

        let rewritten = rewrite(src, &code, &plan);
        layout::format(&rewritten)
    }
}

/// Post-process `raw` with the standard import table.
pub fn postprocess(raw: &[u8]) -> GenerateResult<Vec<u8>> {
    PostProcessor::new().process(raw)
}

fn malformed(src: &str, finding: Finding) -> GenerateError {
    let excerpt = src
        .lines()
        .nth(finding.line.saturating_sub(1))
        .map(str::trim)
        .unwrap_or_default();
    let excerpt = match excerpt.char_indices().nth(EXCERPT_LIMIT) {
        Some((cut, _)) => format!("{}...", &excerpt[..cut]),
        None => excerpt.to_string(),
    };

    GenerateError::MalformedSource {
        reason: finding.reason,
        line: finding.line,
        excerpt,
    }
}

/// Reject unresolved template markup, unbalanced brackets, and files
/// without a package clause.
fn validate(tokens: &[Token<'_>]) -> Result<(), Finding> {
    let code: Vec<&Token<'_>> = tokens.iter().filter(|t| !t.is_comment()).collect();

    for (i, tok) in code.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| code[p]);
        if let Some(marker) = placeholder(prev, &code[i..]) {
            return Err(Finding {
                reason: format!("unresolved template placeholder `{marker}`"),
                line: tok.line,
            });
        }
    }

    let mut open: Vec<&Token<'_>> = Vec::new();
    for tok in &code {
        if tok.is_opener() {
            open.push(tok);
        } else if tok.is_closer() {
            let Some(opener) = open.pop() else {
                return Err(Finding {
                    reason: format!("unexpected `{}`", tok.text),
                    line: tok.line,
                });
            };
            if closer_for(opener.text) != tok.text {
                return Err(Finding {
                    reason: format!(
                        "mismatched `{}`: `{}` opened at line {} is still open",
                        tok.text, opener.text, opener.line
                    ),
                    line: tok.line,
                });
            }
        }
    }
    if let Some(opener) = open.pop() {
        return Err(Finding {
            reason: format!("unclosed `{}`", opener.text),
            line: opener.line,
        });
    }

    match (code.first(), code.get(1)) {
        (Some(keyword), Some(name))
            if keyword.is_ident("package")
                && name.kind == TokenKind::Ident
                && !lexer::KEYWORDS.contains(&name.text) =>
        {
            Ok(())
        }
        (Some(first), _) => Err(Finding {
            reason: "expected package clause".to_string(),
            line: first.line,
        }),
        (None, _) => Err(Finding {
            reason: "expected package clause".to_string(),
            line: 1,
        }),
    }
}

/// Template markup starting at `code[0]`, if any. `prev` is the code token
/// before it.
///
/// `{%` and `%}` always count. `{{` counts when followed by a blank on the
/// same line, by `.`, or by `-` and a blank, and otherwise whenever `prev`
/// cannot precede a composite literal brace. `[][]int{{-1}}` passes while
/// `return {{value}}` does not.
fn placeholder(prev: Option<&Token<'_>>, code: &[&Token<'_>]) -> Option<&'static str> {
    fn adjacent(a: &Token<'_>, b: &Token<'_>) -> bool {
        a.end == b.start
    }
    fn spaced(a: &Token<'_>, b: &Token<'_>) -> bool {
        a.end < b.start && a.end_line == b.line
    }

    let (tok, next) = match code {
        [tok, next, ..] if adjacent(tok, next) => (*tok, *next),
        _ => return None,
    };
    if tok.is_punct("{") && next.text.starts_with('%') {
        return Some("{%");
    }
    if tok.is_punct("%") && next.is_punct("}") {
        return Some("%}");
    }
    if !(tok.is_punct("{") && next.is_punct("{")) {
        return None;
    }
    match code {
        [_, _, after, ..] if spaced(next, after) => Some("{{"),
        [_, _, after, ..] if adjacent(next, after) && after.is_punct(".") => Some("{{"),
        [_, _, after, then, ..]
            if adjacent(next, after) && after.is_punct("-") && spaced(after, then) =>
        {
            Some("{{")
        }
        _ if !opens_composite(prev) => Some("{{"),
        _ => None,
    }
}

/// Whether `prev` can come right before the brace of a composite literal:
/// the end of a literal type (`T`, `pkg.T`, `Pair[K, V]`, `struct{...}`) or
/// an element position inside an outer literal (`{`, `,`, `:`).
fn opens_composite(prev: Option<&Token<'_>>) -> bool {
    prev.is_some_and(|tok| match tok.kind {
        TokenKind::Ident => !KEYWORDS.contains(&tok.text),
        TokenKind::Punct => matches!(tok.text, "]" | "}" | "{" | "," | ":"),
        _ => false,
    })
}

fn closer_for(opener: &str) -> &'static str {
    match opener {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

/// Apply the import plan and drop statement-terminating semicolons.
fn rewrite(src: &str, code: &[Token<'_>], plan: &ImportPlan) -> String {
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    for decl in &plan.decls {
        edits.push((decl.clone(), String::new()));
    }
    if let (Some(name), Some(block)) = (code.get(1), plan.render_block()) {
        edits.push((name.end..name.end, format!("\n\n{block}\n")));
    }

    let in_decl = |pos: usize| plan.decls.iter().any(|d| d.contains(&pos));
    for (i, tok) in code.iter().enumerate() {
        if !tok.is_punct(";") || in_decl(tok.start) {
            continue;
        }
        let terminates = match code.get(i + 1) {
            None => true,
            Some(next) => next.line > tok.line || next.is_punct("}"),
        };
        if terminates {
            edits.push((tok.start..tok.end, String::new()));
        }
    }

    edits.sort_by_key(|(range, _)| (range.start, range.end));

    let mut out = String::with_capacity(src.len() + 256);
    let mut cursor = 0;
    for (range, text) in edits {
        if range.start < cursor {
            continue;
        }
        out.push_str(&src[cursor..range.start]);
        out.push_str(&text);
        cursor = range.end;
    }
    out.push_str(&src[cursor..]);
    out
}
