//! Hand-written lexer for schema text.
//!
//! Produces a finite token sequence with exact [`SourceLocation`]s. Lexical
//! errors (invalid character E1006, unterminated string E1007, malformed
//! number E1008) are reported into the shared [`ErrorCollection`] and the
//! lexer skips to the next recognizable boundary, so one bad character never
//! sinks the rest of the file.

use std::iter::Peekable;
use std::str::CharIndices;

use smol_str::SmolStr;

use crate::diagnostics::{Diagnostic, ErrorCode, ErrorCollection};
use crate::span::SourceLocation;

/// A lexical token with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }
}

/// Token kinds recognized by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Block keywords
    Model,
    Enum,
    Datasource,
    Generator,

    /// Any other identifier, including type names and `true`/`false`.
    Identifier(SmolStr),
    /// A double-quoted string literal, unescaped.
    StringLiteral(String),
    /// An integer literal.
    IntLiteral(i64),
    /// A float literal.
    FloatLiteral(f64),
    /// A `///` documentation comment line, without the marker.
    DocComment(String),

    At,
    AtAt,
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Dot,
    Equals,
    Question,

    /// End of input; always the final token.
    Eof,
}

impl TokenKind {
    /// True for the four top-level block keywords.
    pub fn is_block_keyword(&self) -> bool {
        matches!(
            self,
            Self::Model | Self::Enum | Self::Datasource | Self::Generator
        )
    }

    /// A short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Model => "`model`".into(),
            Self::Enum => "`enum`".into(),
            Self::Datasource => "`datasource`".into(),
            Self::Generator => "`generator`".into(),
            Self::Identifier(name) => format!("`{name}`"),
            Self::StringLiteral(_) => "string literal".into(),
            Self::IntLiteral(_) | Self::FloatLiteral(_) => "number literal".into(),
            Self::DocComment(_) => "documentation comment".into(),
            Self::At => "`@`".into(),
            Self::AtAt => "`@@`".into(),
            Self::LeftBrace => "`{`".into(),
            Self::RightBrace => "`}`".into(),
            Self::LeftParen => "`(`".into(),
            Self::RightParen => "`)`".into(),
            Self::LeftBracket => "`[`".into(),
            Self::RightBracket => "`]`".into(),
            Self::Comma => "`,`".into(),
            Self::Colon => "`:`".into(),
            Self::Dot => "`.`".into(),
            Self::Equals => "`=`".into(),
            Self::Question => "`?`".into(),
            Self::Eof => "end of file".into(),
        }
    }
}

/// Streaming lexer over schema text.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input, reporting lexical errors into `diagnostics`.
    ///
    /// The returned sequence always ends with a single [`TokenKind::Eof`].
    pub fn tokenize(source: &'a str, diagnostics: &mut ErrorCollection) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = vec![];
        loop {
            match lexer.next_token(diagnostics) {
                Some(token) => {
                    let eof = token.kind == TokenKind::Eof;
                    tokens.push(token);
                    if eof {
                        break;
                    }
                }
                // Skipped comment or already-reported lexical error; keep going.
                None => continue,
            }
        }
        tokens
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn current_offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.source.len())
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn location_from(&mut self, line: u32, column: u32, start: usize) -> SourceLocation {
        let end = self.current_offset();
        SourceLocation::new(line, column, start, end - start).with_end(
            self.line,
            self.column.saturating_sub(1).max(1),
        )
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Scan the next token.
    ///
    /// Returns `None` when nothing was produced at this position (a reported
    /// lexical error, or a plain comment); callers should simply ask for the
    /// next token.
    fn next_token(&mut self, diagnostics: &mut ErrorCollection) -> Option<Token> {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;
        let start = self.current_offset();

        let Some(c) = self.peek_char() else {
            return Some(Token::new(
                TokenKind::Eof,
                SourceLocation::new(line, column, start, 0),
            ));
        };

        match c {
            '/' => self.scan_comment(line, column, start, diagnostics),
            '"' => self.scan_string(line, column, start, diagnostics),
            '@' => {
                self.bump();
                let kind = if self.peek_char() == Some('@') {
                    self.bump();
                    TokenKind::AtAt
                } else {
                    TokenKind::At
                };
                Some(Token::new(kind, self.location_from(line, column, start)))
            }
            '{' | '}' | '(' | ')' | '[' | ']' | ',' | ':' | '.' | '=' | '?' => {
                self.bump();
                let kind = match c {
                    '{' => TokenKind::LeftBrace,
                    '}' => TokenKind::RightBrace,
                    '(' => TokenKind::LeftParen,
                    ')' => TokenKind::RightParen,
                    '[' => TokenKind::LeftBracket,
                    ']' => TokenKind::RightBracket,
                    ',' => TokenKind::Comma,
                    ':' => TokenKind::Colon,
                    '.' => TokenKind::Dot,
                    '=' => TokenKind::Equals,
                    _ => TokenKind::Question,
                };
                Some(Token::new(kind, self.location_from(line, column, start)))
            }
            c if c.is_ascii_digit() || c == '-' => {
                self.scan_number(line, column, start, diagnostics)
            }
            c if c.is_alphabetic() || c == '_' => Some(self.scan_identifier(line, column, start)),
            other => {
                self.bump();
                let location = self.location_from(line, column, start);
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E1006,
                    format!("Invalid character `{other}`"),
                    location,
                ));
                None
            }
        }
    }

    fn scan_identifier(&mut self, line: u32, column: u32, start: usize) -> Token {
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let end = self.current_offset();
        let text = &self.source[start..end];
        let kind = match text {
            "model" => TokenKind::Model,
            "enum" => TokenKind::Enum,
            "datasource" => TokenKind::Datasource,
            "generator" => TokenKind::Generator,
            other => TokenKind::Identifier(SmolStr::new(other)),
        };
        Token::new(kind, self.location_from(line, column, start))
    }

    fn scan_number(
        &mut self,
        line: u32,
        column: u32,
        start: usize,
        diagnostics: &mut ErrorCollection,
    ) -> Option<Token> {
        if self.peek_char() == Some('-') {
            self.bump();
            if !self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                let location = self.location_from(line, column, start);
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E1006,
                    "Invalid character `-`".to_string(),
                    location,
                ));
                return None;
            }
        }

        let mut is_float = false;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.bump();
            } else if c == '.' && !is_float {
                // Lookahead: `.` must be followed by a digit to be a float.
                let mut ahead = self.chars.clone();
                ahead.next();
                match ahead.peek() {
                    Some(&(_, d)) if d.is_ascii_digit() => {
                        is_float = true;
                        self.bump();
                    }
                    _ => break,
                }
            } else {
                break;
            }
        }

        // A trailing identifier character makes the literal malformed.
        if self.peek_char().is_some_and(|c| c.is_alphabetic() || c == '_') {
            while self.peek_char().is_some_and(|c| c.is_alphanumeric() || c == '_') {
                self.bump();
            }
            let location = self.location_from(line, column, start);
            let end = location.offset + location.length;
            diagnostics.push(Diagnostic::new(
                ErrorCode::E1008,
                format!("Invalid number literal `{}`", &self.source[start..end]),
                location,
            ));
            return None;
        }

        let end = self.current_offset();
        let text = &self.source[start..end];
        let location = self.location_from(line, column, start);
        let kind = if is_float {
            match text.parse::<f64>() {
                Ok(v) => TokenKind::FloatLiteral(v),
                Err(_) => {
                    diagnostics.push(Diagnostic::new(
                        ErrorCode::E1008,
                        format!("Invalid number literal `{text}`"),
                        location,
                    ));
                    return None;
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => TokenKind::IntLiteral(v),
                Err(_) => {
                    diagnostics.push(Diagnostic::new(
                        ErrorCode::E1008,
                        format!("Invalid number literal `{text}`"),
                        location,
                    ));
                    return None;
                }
            }
        };
        Some(Token::new(kind, location))
    }

    fn scan_string(
        &mut self,
        line: u32,
        column: u32,
        start: usize,
        diagnostics: &mut ErrorCollection,
    ) -> Option<Token> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.bump();
                    return Some(Token::new(
                        TokenKind::StringLiteral(value),
                        self.location_from(line, column, start),
                    ));
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some(other) => value.push(other),
                        None => break,
                    }
                }
                Some('\n') | None => break,
                Some(other) => {
                    value.push(other);
                    self.bump();
                }
            }
        }
        // Unterminated: report at the opening quote and resume at the boundary.
        let location = self.location_from(line, column, start);
        diagnostics.push(
            Diagnostic::new(ErrorCode::E1007, "Unterminated string literal", location)
                .with_suggestion("Add a closing `\"`"),
        );
        None
    }

    fn scan_comment(
        &mut self,
        line: u32,
        column: u32,
        start: usize,
        diagnostics: &mut ErrorCollection,
    ) -> Option<Token> {
        self.bump(); // first '/'
        if self.peek_char() != Some('/') {
            let location = self.location_from(line, column, start);
            diagnostics.push(Diagnostic::new(
                ErrorCode::E1006,
                "Invalid character `/`",
                location,
            ));
            return None;
        }
        self.bump(); // second '/'
        let is_doc = self.peek_char() == Some('/');
        if is_doc {
            self.bump();
        }

        let text_start = self.current_offset();
        while self.peek_char().is_some_and(|c| c != '\n') {
            self.bump();
        }
        if is_doc {
            let text = self.source[text_start..self.current_offset()].trim().to_string();
            return Some(Token::new(
                TokenKind::DocComment(text),
                self.location_from(line, column, start),
            ));
        }
        // Plain comments produce no token; the caller asks again.
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorCode;
    use pretty_assertions::assert_eq;

    fn lex(source: &str) -> (Vec<Token>, ErrorCollection) {
        let mut diagnostics = ErrorCollection::new();
        let tokens = Lexer::tokenize(source, &mut diagnostics);
        (tokens, diagnostics)
    }

    fn kinds(tokens: &[Token]) -> Vec<&TokenKind> {
        tokens.iter().map(|t| &t.kind).collect()
    }

    // ==================== Basic Tokens ====================

    #[test]
    fn test_lex_model_header() {
        let (tokens, diagnostics) = lex("model User {}");
        assert!(diagnostics.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![
                &TokenKind::Model,
                &TokenKind::Identifier("User".into()),
                &TokenKind::LeftBrace,
                &TokenKind::RightBrace,
                &TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_positions() {
        let (tokens, _) = lex("model User {\n  id Int\n}");
        let id = &tokens[3];
        assert_eq!(id.kind, TokenKind::Identifier("id".into()));
        assert_eq!(id.location.line, 2);
        assert_eq!(id.location.column, 3);
        assert_eq!(id.location.offset, 15);
        assert_eq!(id.location.length, 2);
    }

    #[test]
    fn test_lex_attribute_markers() {
        let (tokens, _) = lex("@id @@map");
        assert_eq!(tokens[0].kind, TokenKind::At);
        assert_eq!(tokens[2].kind, TokenKind::AtAt);
    }

    #[test]
    fn test_lex_punctuation() {
        let (tokens, diagnostics) = lex("( ) [ ] , : = ? .");
        assert!(diagnostics.is_empty());
        assert_eq!(
            kinds(&tokens),
            vec![
                &TokenKind::LeftParen,
                &TokenKind::RightParen,
                &TokenKind::LeftBracket,
                &TokenKind::RightBracket,
                &TokenKind::Comma,
                &TokenKind::Colon,
                &TokenKind::Equals,
                &TokenKind::Question,
                &TokenKind::Dot,
                &TokenKind::Eof,
            ]
        );
    }

    // ==================== Literals ====================

    #[test]
    fn test_lex_string_literal() {
        let (tokens, diagnostics) = lex(r#""hello world""#);
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral("hello world".into()));
    }

    #[test]
    fn test_lex_string_escapes() {
        let (tokens, _) = lex(r#""a\"b""#);
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral("a\"b".into()));
    }

    #[test]
    fn test_lex_numbers() {
        let (tokens, diagnostics) = lex("42 -7 3.25");
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral(42));
        assert_eq!(tokens[1].kind, TokenKind::IntLiteral(-7));
        assert_eq!(tokens[2].kind, TokenKind::FloatLiteral(3.25));
    }

    #[test]
    fn test_lex_doc_comment() {
        let (tokens, _) = lex("/// The user model\nmodel User {}");
        assert_eq!(
            tokens[0].kind,
            TokenKind::DocComment("The user model".into())
        );
        assert_eq!(tokens[1].kind, TokenKind::Model);
    }

    #[test]
    fn test_lex_skips_plain_comments() {
        let (tokens, diagnostics) = lex("// nothing to see\nmodel User {}");
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Model);
    }

    #[test]
    fn test_lex_long_comment_runs() {
        // Comment-heavy files must lex in constant stack space.
        let mut source = String::from("model User {\n  id Int\n}\n");
        for _ in 0..100_000 {
            source.push_str("// filler\n");
        }
        let (tokens, diagnostics) = lex(&source);
        assert!(diagnostics.is_empty());
        assert_eq!(tokens.len(), 7);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    // ==================== Error Recovery ====================

    #[test]
    fn test_lex_invalid_character_recovers() {
        let (tokens, diagnostics) = lex("model § User");
        assert_eq!(diagnostics.count_of(ErrorCode::E1006), 1);
        // Both surrounding tokens survive.
        assert_eq!(tokens[0].kind, TokenKind::Model);
        assert_eq!(tokens[1].kind, TokenKind::Identifier("User".into()));
    }

    #[test]
    fn test_lex_unterminated_string_recovers() {
        let (tokens, diagnostics) = lex("\"oops\nmodel User {}");
        assert_eq!(diagnostics.count_of(ErrorCode::E1007), 1);
        let d = diagnostics.errors().next().unwrap();
        assert_eq!(d.location.line, 1);
        assert_eq!(d.location.column, 1);
        assert_eq!(tokens[0].kind, TokenKind::Model);
    }

    #[test]
    fn test_lex_bad_number_recovers() {
        let (tokens, diagnostics) = lex("123abc model");
        assert_eq!(diagnostics.count_of(ErrorCode::E1008), 1);
        assert_eq!(tokens[0].kind, TokenKind::Model);
    }

    #[test]
    fn test_lex_empty_input() {
        let (tokens, diagnostics) = lex("");
        assert!(diagnostics.is_empty());
        assert_eq!(kinds(&tokens), vec![&TokenKind::Eof]);
    }

    #[test]
    fn test_lex_is_restartable() {
        let source = "model User { id Int }";
        let (first, _) = lex(source);
        let (second, _) = lex(source);
        assert_eq!(first, second);
    }
}
