//! Canonical layout for Go source.
//!
//! Re-indents every line by bracket depth, outdents `case`/`default`,
//! aligns struct fields and composite literal keys, and normalizes blank
//! lines. Continuation lines of raw strings and block comments pass through
//! untouched.

use super::Finding;
use super::lexer::{Token, TokenKind, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Struct,
    Interface,
    Block,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeKind {
    Field,
    KeyValue,
}

/// A line that takes part in column alignment: `head` padded, then `tail`.
#[derive(Debug)]
struct Shape {
    kind: ShapeKind,
    head: String,
    tail: String,
}

#[derive(Debug)]
enum Row {
    Blank,
    Verbatim(String),
    Code {
        indent: usize,
        text: String,
        shape: Option<Shape>,
    },
}

const CONTINUERS: &[&str] = &[
    "+", "-", "*", "/", "%", "&", "|", "^", "<<", ">>", "&^", "&&", "||", "==", "!=", "<", "<=",
    ">", ">=", "=", ":=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", "&^=",
    ".", "<-",
];

/// Lay out `src`, returning text that ends in exactly one newline.
pub(crate) fn format(src: &str) -> Result<String, Finding> {
    let tokens = tokenize(src)?;
    let lines: Vec<&str> = src.split('\n').collect();

    let mut offsets = Vec::with_capacity(lines.len());
    let mut offset = 0;
    for line in &lines {
        offsets.push(offset);
        offset += line.len() + 1;
    }

    // Index by 0-based line number
    let mut verbatim = vec![false; lines.len()];
    let mut by_line: Vec<Vec<Token<'_>>> = vec![Vec::new(); lines.len()];
    for tok in &tokens {
        if tok.is_multiline() {
            for flag in &mut verbatim[tok.line..tok.end_line] {
                *flag = true;
            }
        }
        by_line[tok.line - 1].push(*tok);
    }

    let mut stack: Vec<(usize, BlockKind)> = Vec::new();
    let mut last_code: Option<Token<'_>> = None;
    let mut rows = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        let line_tokens = &by_line[index];

        if verbatim[index] {
            rows.push(Row::Verbatim((*line).to_string()));
            track(line_tokens, &mut stack, &mut last_code);
            continue;
        }

        // A raw string opening on this line keeps its trailing spaces
        let text = if line_tokens.last().is_some_and(|t| t.is_multiline()) {
            line.trim_start()
        } else {
            line.trim()
        };
        if text.is_empty() {
            rows.push(Row::Blank);
            continue;
        }

        let leading_closers = line_tokens.iter().take_while(|t| t.is_closer()).count();
        for _ in 0..leading_closers {
            stack.pop();
        }

        let mut indent = distinct_lines(&stack);
        let innermost = stack.last().copied();
        let first = line_tokens.first();

        if first.is_some_and(|t| t.is_ident("case") || t.is_ident("default"))
            && innermost.is_some_and(|(_, kind)| kind == BlockKind::Block)
        {
            indent = indent.saturating_sub(1);
        }
        if leading_closers == 0 && continues(last_code.as_ref(), innermost) {
            indent += 1;
        }

        let line_end = offsets[index] + line.trim_end().len();
        let shape = innermost.and_then(|(_, kind)| shape_of(src, line_tokens, kind, line_end));
        rows.push(Row::Code {
            indent,
            text: text.to_string(),
            shape,
        });

        if let Some(closer) = line_tokens[..leading_closers].last() {
            last_code = Some(*closer);
        }
        track(&line_tokens[leading_closers..], &mut stack, &mut last_code);
    }

    align(&mut rows);
    Ok(render(rows))
}

/// Update the bracket stack and last code token with one line's tokens.
fn track<'a>(
    tokens: &[Token<'a>],
    stack: &mut Vec<(usize, BlockKind)>,
    last_code: &mut Option<Token<'a>>,
) {
    for tok in tokens {
        if tok.is_comment() {
            continue;
        }
        if tok.is_opener() {
            let kind = match tok.text {
                "{" => match last_code {
                    Some(prev) if prev.is_ident("struct") => BlockKind::Struct,
                    Some(prev) if prev.is_ident("interface") => BlockKind::Interface,
                    _ => BlockKind::Block,
                },
                _ => BlockKind::Group,
            };
            stack.push((tok.end_line, kind));
        } else if tok.is_closer() {
            stack.pop();
        }
        *last_code = Some(*tok);
    }
}

/// Brackets opened on the same line count as one level.
fn distinct_lines(stack: &[(usize, BlockKind)]) -> usize {
    let mut count = 0;
    let mut previous = None;
    for (line, _) in stack {
        if previous != Some(*line) {
            count += 1;
            previous = Some(*line);
        }
    }
    count
}

/// Whether the previous line left an expression open.
fn continues(last_code: Option<&Token<'_>>, innermost: Option<(usize, BlockKind)>) -> bool {
    let Some(last) = last_code else {
        return false;
    };
    let open_operator = last.kind == TokenKind::Punct && CONTINUERS.contains(&last.text);
    open_operator && innermost.is_none_or(|(line, _)| line != last.end_line)
}

fn shape_of(src: &str, tokens: &[Token<'_>], kind: BlockKind, line_end: usize) -> Option<Shape> {
    let last = tokens.iter().rev().find(|t| !t.is_comment())?;
    if tokens.iter().any(|t| t.is_multiline()) || last.is_punct("{") {
        return None;
    }
    let first = tokens.first().filter(|t| t.kind == TokenKind::Ident)?;
    let second = tokens.get(1)?;

    match kind {
        BlockKind::Struct => {
            if second.is_comment() || second.is_punct(".") || second.is_punct(",") {
                return None;
            }
            Some(Shape {
                kind: ShapeKind::Field,
                head: first.text.to_string(),
                tail: src[second.start..line_end].to_string(),
            })
        }
        BlockKind::Block => {
            let value = tokens.get(2)?;
            if !second.is_punct(":") || !last.is_punct(",") || first.is_ident("case") {
                return None;
            }
            Some(Shape {
                kind: ShapeKind::KeyValue,
                head: format!("{}:", first.text),
                tail: src[value.start..line_end].to_string(),
            })
        }
        BlockKind::Interface | BlockKind::Group => None,
    }
}

/// Pad the heads of each run of same-shape, same-indent rows to a common width.
fn align(rows: &mut [Row]) {
    let mut start = 0;
    while start < rows.len() {
        let Some((kind, indent)) = shape_key(&rows[start]) else {
            start += 1;
            continue;
        };
        let mut end = start + 1;
        while end < rows.len() && shape_key(&rows[end]) == Some((kind, indent)) {
            end += 1;
        }

        let width = rows[start..end]
            .iter()
            .filter_map(|row| match row {
                Row::Code {
                    shape: Some(shape), ..
                } => Some(shape.head.chars().count()),
                _ => None,
            })
            .max()
            .unwrap_or_default()
            + 1;

        for row in &mut rows[start..end] {
            if let Row::Code {
                text,
                shape: Some(shape),
                ..
            } = row
            {
                let pad = width - shape.head.chars().count();
                *text = format!("{}{}{}", shape.head, " ".repeat(pad), shape.tail);
            }
        }
        start = end;
    }
}

fn shape_key(row: &Row) -> Option<(ShapeKind, usize)> {
    match row {
        Row::Code {
            indent,
            shape: Some(shape),
            ..
        } => Some((shape.kind, *indent)),
        _ => None,
    }
}

fn render(rows: Vec<Row>) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(rows.len());
    let mut pending_blank = false;

    for row in rows {
        let line = match row {
            Row::Blank => {
                pending_blank = !lines.is_empty();
                continue;
            }
            Row::Verbatim(text) => text,
            Row::Code { indent, text, .. } => format!("{}{}", "\t".repeat(indent), text),
        };
        if pending_blank {
            lines.push(String::new());
            pending_blank = false;
        }
        lines.push(line);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
