//! Go tokenizer.
//!
//! Produces just enough structure for validation, import analysis, and
//! layout: identifiers, literals, comments, and operators with their byte
//! spans and line numbers. Semicolon insertion is not modelled.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident,
    Number,
    String,
    RawString,
    Rune,
    LineComment,
    BlockComment,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based line of the last character.
    pub end_line: usize,
}

impl Token<'_> {
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    pub fn is_punct(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == punct
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == name
    }

    pub fn is_opener(&self) -> bool {
        self.kind == TokenKind::Punct && matches!(self.text, "(" | "[" | "{")
    }

    pub fn is_closer(&self) -> bool {
        self.kind == TokenKind::Punct && matches!(self.text, ")" | "]" | "}")
    }

    /// Whether this token spans more than one line.
    pub fn is_multiline(&self) -> bool {
        self.end_line > self.line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexError {
    pub reason: String,
    pub line: usize,
}

/// Go keywords; never package qualifiers or declared names.
pub(crate) const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

// Longest first so greedy matching picks `<<=` over `<<` over `<`.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "-", "*", "/", "%", "&", "|",
    "^", "<", ">", "=", "!", "(", ")", "[", "]", "{", "}", ",", ";", ".", ":", "~",
];

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    fn previous(&self) -> Option<char> {
        self.src[..self.pos].chars().next_back()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, reason: impl Into<String>, line: usize) -> LexError {
        LexError {
            reason: reason.into(),
            line,
        }
    }

    fn line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn block_comment(&mut self, line: usize) -> Result<(), LexError> {
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated block comment", line)),
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
            }
        }
    }

    /// Interpreted string or rune literal closed by `quote` on the same line.
    fn quoted(&mut self, quote: char, what: &str, line: usize) -> Result<(), LexError> {
        self.bump();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error(format!("unterminated {what} literal"), line));
                }
                Some('\\') => match self.bump() {
                    None | Some('\n') => {
                        return Err(self.error(format!("unterminated {what} literal"), line));
                    }
                    Some(_) => {}
                },
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn raw_string(&mut self, line: usize) -> Result<(), LexError> {
        self.bump();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated raw string literal", line)),
                Some('`') => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn identifier(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn number(&mut self) {
        let hex = self.rest().starts_with("0x") || self.rest().starts_with("0X");
        let mut prev = '\0';
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '+' | '-')
                && if hex {
                    matches!(prev, 'p' | 'P')
                } else {
                    matches!(prev, 'e' | 'E')
                };
            let dot = c == '.' && self.peek_second() != Some('.');
            if c.is_ascii_alphanumeric() || c == '_' || dot || exponent_sign {
                self.bump();
                prev = c;
            } else {
                break;
            }
        }
    }

    fn operator(&mut self, line: usize) -> Result<(), LexError> {
        match OPERATORS.iter().find(|op| self.rest().starts_with(**op)) {
            Some(op) => {
                self.pos += op.len();
                Ok(())
            }
            None => Err(self.unexpected(line)),
        }
    }

    fn unexpected(&self, line: usize) -> LexError {
        let c = self.peek().unwrap_or_default();
        let before = self.previous();
        let after = self.peek_second();
        if c == '#' && (before == Some('{') || after == Some('}')) {
            let marker = if before == Some('{') { "{#" } else { "#}" };
            return self.error(format!("unresolved template placeholder `{marker}`"), line);
        }
        self.error(format!("unexpected character {c:?}"), line)
    }
}

/// Split Go source into tokens.
pub(crate) fn tokenize(src: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut lexer = Lexer { src, pos: 0, line: 1 };
    let mut tokens = Vec::new();

    while let Some(c) = lexer.peek() {
        if matches!(c, ' ' | '\t' | '\r' | '\n') {
            lexer.bump();
            continue;
        }

        let start = lexer.pos;
        let line = lexer.line;
        let kind = match c {
            '/' if lexer.peek_second() == Some('/') => {
                lexer.line_comment();
                TokenKind::LineComment
            }
            '/' if lexer.peek_second() == Some('*') => {
                lexer.block_comment(line)?;
                TokenKind::BlockComment
            }
            '"' => {
                lexer.quoted('"', "string", line)?;
                TokenKind::String
            }
            '\'' => {
                lexer.quoted('\'', "rune", line)?;
                TokenKind::Rune
            }
            '`' => {
                lexer.raw_string(line)?;
                TokenKind::RawString
            }
            c if c.is_alphabetic() || c == '_' => {
                lexer.identifier();
                TokenKind::Ident
            }
            c if c.is_ascii_digit() => {
                lexer.number();
                TokenKind::Number
            }
            '.' if lexer.peek_second().is_some_and(|n| n.is_ascii_digit()) => {
                lexer.number();
                TokenKind::Number
            }
            _ => {
                lexer.operator(line)?;
                TokenKind::Punct
            }
        };

        tokens.push(Token {
            kind,
            text: &src[start..lexer.pos],
            start,
            end: lexer.pos,
            line,
            end_line: lexer.line,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn tokenize___simple_statement() {
        assert_eq!(
            kinds("x := a.B(1, \"s\")"),
            [
                (TokenKind::Ident, "x"),
                (TokenKind::Punct, ":="),
                (TokenKind::Ident, "a"),
                (TokenKind::Punct, "."),
                (TokenKind::Ident, "B"),
                (TokenKind::Punct, "("),
                (TokenKind::Number, "1"),
                (TokenKind::Punct, ","),
                (TokenKind::String, "\"s\""),
                (TokenKind::Punct, ")"),
            ]
        );
    }

    #[test]
    fn tokenize___greedy_operators() {
        assert_eq!(
            kinds("a <<= b &^ c ... <-ch"),
            [
                (TokenKind::Ident, "a"),
                (TokenKind::Punct, "<<="),
                (TokenKind::Ident, "b"),
                (TokenKind::Punct, "&^"),
                (TokenKind::Ident, "c"),
                (TokenKind::Punct, "..."),
                (TokenKind::Punct, "<-"),
                (TokenKind::Ident, "ch"),
            ]
        );
    }

    #[test]
    fn tokenize___numbers() {
        assert_eq!(
            kinds("1e+9 0x1p-2 .5 1_000 0xff+1"),
            [
                (TokenKind::Number, "1e+9"),
                (TokenKind::Number, "0x1p-2"),
                (TokenKind::Number, ".5"),
                (TokenKind::Number, "1_000"),
                (TokenKind::Number, "0xff"),
                (TokenKind::Punct, "+"),
                (TokenKind::Number, "1"),
            ]
        );
    }

    #[test]
    fn tokenize___comments_and_strings_hide_delimiters() {
        let tokens = kinds("// {{ x }\n/* ( */ \"{\" '}' `[`");

        assert_eq!(tokens.len(), 5);
        assert!(tokens.iter().all(|(kind, _)| *kind != TokenKind::Punct));
    }

    #[test]
    fn tokenize___tracks_lines_across_raw_strings() {
        let tokens = tokenize("a\n`x\ny\nz` b").unwrap();

        assert_eq!(tokens[1].kind, TokenKind::RawString);
        assert_eq!((tokens[1].line, tokens[1].end_line), (2, 4));
        assert!(tokens[1].is_multiline());
        assert_eq!(tokens[2].line, 4);
    }

    #[test]
    fn tokenize___escaped_quote_in_string() {
        assert_eq!(kinds(r#""a\"b""#), [(TokenKind::String, r#""a\"b""#)]);
    }

    #[test]
    fn tokenize___unicode_identifier() {
        assert_eq!(kinds("größe"), [(TokenKind::Ident, "größe")]);
    }

    #[test]
    fn tokenize___unterminated_string___errors() {
        let err = tokenize("x := \"abc\ny := 1").unwrap_err();

        assert_eq!(err.reason, "unterminated string literal");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn tokenize___unterminated_block_comment___errors() {
        let err = tokenize("a\n/* never closed").unwrap_err();

        assert_eq!(err.reason, "unterminated block comment");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn tokenize___unterminated_raw_string___errors() {
        let err = tokenize("`open").unwrap_err();

        assert_eq!(err.reason, "unterminated raw string literal");
    }

    #[test]
    fn tokenize___unterminated_rune___errors() {
        let err = tokenize("'a").unwrap_err();

        assert_eq!(err.reason, "unterminated rune literal");
    }

    #[test]
    fn tokenize___unexpected_character___errors() {
        let err = tokenize("a ? b").unwrap_err();

        assert_eq!(err.reason, "unexpected character '?'");
    }

    #[test]
    fn tokenize___comment_placeholder___reports_template_marker() {
        let err = tokenize("x\n{# note #}").unwrap_err();

        assert_eq!(err.reason, "unresolved template placeholder `{#`");
        assert_eq!(err.line, 2);
    }
}
