//! UTF-8 scanner producing the OmniLang token stream.
//!
//! The lexer normalizes CRLF/CR line endings to LF and skips a leading BOM
//! before scanning. Tokens are produced on demand via [`Lexer::next_token`];
//! [`Lexer::lex_all`] is the eager convenience that keeps whatever tokens
//! were produced before an error.
//!
//! Lexeme conventions: operators and punctuation carry the exact source
//! text; numeric literals carry the underscore-stripped form; identifiers
//! are NFC-normalized before keyword lookup; string, interpolation, and
//! char tokens carry the raw inner text with the surrounding quotes
//! stripped and escapes left as written (the parser decodes them).

use crate::diag::{Diagnostic, Position, Span};
use crate::token::{Token, TokenKind};
use unicode_ident::{is_xid_continue, is_xid_start};
use unicode_normalization::UnicodeNormalization;

/// Number of runes the lookahead cache holds.
///
/// Keeps `next_token` near-amortized constant time on identifiers: the
/// cache is filled once per cursor position and invalidated on advance.
const PEEK_CACHE_SIZE: usize = 4;

pub struct Lexer {
    file: String,
    chars: Vec<char>,
    /// Normalized source split into lines, for diagnostic excerpts.
    lines: Vec<String>,
    pos: usize,
    line: u32,
    column: u32,
    /// Cached lookahead runes starting at `cache_pos`.
    cache: [Option<char>; PEEK_CACHE_SIZE],
    cache_pos: usize,
    cache_valid: bool,
}

impl Lexer {
    pub fn new(file: impl Into<String>, source: &str) -> Self {
        let normalized = normalize(source);
        let lines = normalized.split('\n').map(str::to_string).collect();
        Lexer {
            file: file.into(),
            chars: normalized.chars().collect(),
            lines,
            pos: 0,
            line: 1,
            column: 1,
            cache: [None; PEEK_CACHE_SIZE],
            cache_pos: 0,
            cache_valid: false,
        }
    }

    /// Lex the entire source. On error, returns the tokens produced so far
    /// together with the diagnostic so callers can show partial context.
    pub fn lex_all(&mut self) -> (Vec<Token>, Option<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            match self.next_token() {
                Ok(token) => {
                    let done = token.kind == TokenKind::Eof;
                    tokens.push(token);
                    if done {
                        return (tokens, None);
                    }
                }
                Err(diag) => return (tokens, Some(diag)),
            }
        }
    }

    /// Produce the next token, or a diagnostic pointing at the failure
    /// origin (not the current cursor).
    pub fn next_token(&mut self) -> Result<Token, Diagnostic> {
        self.skip_trivia()?;

        let start = self.position();
        let c = match self.peek(0) {
            Some(c) => c,
            None => return Ok(Token::new(TokenKind::Eof, "", Span::at(start))),
        };

        if c == '_' || is_xid_start(c) {
            return Ok(self.scan_identifier(start));
        }
        if c.is_ascii_digit() {
            return self.scan_number(start);
        }
        if c == '"' {
            return self.scan_string(start);
        }
        if c == '\'' {
            return self.scan_char(start);
        }
        self.scan_operator(start)
    }

    // ------------------------------------------------------------------
    // Trivia
    // ------------------------------------------------------------------

    fn skip_trivia(&mut self) -> Result<(), Diagnostic> {
        loop {
            match self.peek(0) {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek(1) == Some('/') => {
                    while let Some(c) = self.peek(0) {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek(1) == Some('*') => {
                    self.skip_block_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skip a block comment, tracking nesting depth. An unterminated
    /// comment is reported at its opening `/*`.
    fn skip_block_comment(&mut self) -> Result<(), Diagnostic> {
        let open = self.position();
        self.advance(); // '/'
        self.advance(); // '*'
        let mut depth = 1usize;
        while depth > 0 {
            match (self.peek(0), self.peek(1)) {
                (Some('/'), Some('*')) => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                (Some('*'), Some('/')) => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                }
                (Some(_), _) => {
                    self.advance();
                }
                (None, _) => {
                    return Err(self.error_at(open, "unterminated block comment"));
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Identifiers and keywords
    // ------------------------------------------------------------------

    fn scan_identifier(&mut self, start: Position) -> Token {
        let mut raw = String::new();
        while let Some(c) = self.peek(0) {
            if c == '_' || is_xid_continue(c) {
                raw.push(c);
                self.advance();
            } else {
                break;
            }
        }
        // NFC-normalize before keyword lookup so visually identical
        // identifiers compare equal.
        let lexeme: String = raw.nfc().collect();
        let span = Span::new(start, self.position());
        match TokenKind::keyword(&lexeme) {
            Some(kind) => Token::new(kind, lexeme, span),
            None => Token::new(TokenKind::Ident, lexeme, span),
        }
    }

    // ------------------------------------------------------------------
    // Numbers
    // ------------------------------------------------------------------

    fn scan_number(&mut self, start: Position) -> Result<Token, Diagnostic> {
        if self.peek(0) == Some('0') {
            match self.peek(1) {
                Some('x') | Some('X') => return self.scan_radix(start, TokenKind::Hex),
                Some('b') | Some('B') => return self.scan_radix(start, TokenKind::Binary),
                _ => {}
            }
        }

        let mut lexeme = String::new();
        self.scan_digit_run(start, &mut lexeme, |c| c.is_ascii_digit())?;

        let mut kind = TokenKind::Int;

        // A '.' only belongs to the number when a digit follows; otherwise
        // it is left for the DOT token so method syntax works.
        if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            kind = TokenKind::Float;
            lexeme.push('.');
            self.advance();
            self.scan_digit_run(start, &mut lexeme, |c| c.is_ascii_digit())?;
        }

        if matches!(self.peek(0), Some('e') | Some('E')) {
            kind = TokenKind::Float;
            lexeme.push(self.peek(0).unwrap());
            self.advance();
            if matches!(self.peek(0), Some('+') | Some('-')) {
                lexeme.push(self.peek(0).unwrap());
                self.advance();
            }
            if !self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error_at(start, "exponent with no digits"));
            }
            self.scan_digit_run(start, &mut lexeme, |c| c.is_ascii_digit())?;
        }

        Ok(Token::new(kind, lexeme, Span::new(start, self.position())))
    }

    fn scan_radix(&mut self, start: Position, kind: TokenKind) -> Result<Token, Diagnostic> {
        let mut lexeme = String::new();
        lexeme.push('0');
        self.advance();
        lexeme.push(self.peek(0).unwrap()); // 'x'/'X'/'b'/'B'
        self.advance();
        let is_digit: fn(char) -> bool = if kind == TokenKind::Hex {
            |c| c.is_ascii_hexdigit()
        } else {
            |c| c == '0' || c == '1'
        };
        if !self.peek(0).is_some_and(|c| is_digit(c) || c == '_') {
            let what = if kind == TokenKind::Hex { "hex" } else { "binary" };
            return Err(self.error_at(start, format!("{} literal with no digits", what)));
        }
        self.scan_digit_run(start, &mut lexeme, is_digit)?;
        Ok(Token::new(kind, lexeme, Span::new(start, self.position())))
    }

    /// Scan a run of digits with `_` separators, appending the stripped
    /// digits to `lexeme`. Underscores may only sit between digits.
    fn scan_digit_run(
        &mut self,
        start: Position,
        lexeme: &mut String,
        is_digit: impl Fn(char) -> bool,
    ) -> Result<(), Diagnostic> {
        let mut prev_underscore = false;
        let mut any_digit = false;
        if self.peek(0) == Some('_') {
            return Err(self.error_at(start, "underscore must be between digits"));
        }
        while let Some(c) = self.peek(0) {
            if is_digit(c) {
                lexeme.push(c);
                self.advance();
                prev_underscore = false;
                any_digit = true;
            } else if c == '_' {
                if prev_underscore {
                    return Err(self.error_at(start, "adjacent underscores in numeric literal"));
                }
                self.advance();
                prev_underscore = true;
            } else {
                break;
            }
        }
        if prev_underscore {
            return Err(self.error_at(start, "trailing underscore in numeric literal"));
        }
        if !any_digit {
            return Err(self.error_at(start, "underscore must be between digits"));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Strings and chars
    // ------------------------------------------------------------------

    fn scan_string(&mut self, start: Position) -> Result<Token, Diagnostic> {
        self.advance(); // opening quote
        let mut raw = String::new();
        let mut kind = TokenKind::String;

        loop {
            match self.peek(0) {
                None => return Err(self.error_at(start, "unterminated string literal")),
                Some('\n') => return Err(self.error_at(start, "unterminated string literal")),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.scan_escape(&mut raw)?;
                }
                Some('$') if self.peek(1) == Some('{') => {
                    kind = TokenKind::StringInterp;
                    raw.push('$');
                    raw.push('{');
                    self.advance();
                    self.advance();
                    self.scan_interpolation(start, &mut raw)?;
                }
                Some(c) => {
                    raw.push(c);
                    self.advance();
                }
            }
        }

        Ok(Token::new(kind, raw, Span::new(start, self.position())))
    }

    /// Consume an interpolated `${ … }` body up to its balancing `}`,
    /// copying the raw text. Nested strings, chars, and comments inside
    /// the braces are skipped whole so their braces and quotes do not
    /// terminate the outer string.
    fn scan_interpolation(&mut self, open: Position, raw: &mut String) -> Result<(), Diagnostic> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek(0) {
                None => return Err(self.error_at(open, "unterminated string interpolation")),
                Some('{') => {
                    raw.push('{');
                    self.advance();
                    depth += 1;
                }
                Some('}') => {
                    raw.push('}');
                    self.advance();
                    depth -= 1;
                }
                Some('"') => {
                    self.copy_nested_string(open, raw)?;
                }
                Some('\'') => {
                    self.copy_nested_char(open, raw)?;
                }
                Some('/') if self.peek(1) == Some('/') => {
                    while let Some(c) = self.peek(0) {
                        raw.push(c);
                        self.advance();
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek(1) == Some('*') => {
                    let mut comment_depth = 0usize;
                    loop {
                        match (self.peek(0), self.peek(1)) {
                            (Some('/'), Some('*')) => {
                                raw.push('/');
                                raw.push('*');
                                self.advance();
                                self.advance();
                                comment_depth += 1;
                            }
                            (Some('*'), Some('/')) => {
                                raw.push('*');
                                raw.push('/');
                                self.advance();
                                self.advance();
                                comment_depth -= 1;
                                if comment_depth == 0 {
                                    break;
                                }
                            }
                            (Some(c), _) => {
                                raw.push(c);
                                self.advance();
                            }
                            (None, _) => {
                                return Err(self.error_at(open, "unterminated block comment"));
                            }
                        }
                    }
                }
                Some(c) => {
                    raw.push(c);
                    self.advance();
                }
            }
        }
        Ok(())
    }

    fn copy_nested_string(&mut self, open: Position, raw: &mut String) -> Result<(), Diagnostic> {
        raw.push('"');
        self.advance();
        loop {
            match self.peek(0) {
                None => return Err(self.error_at(open, "unterminated string literal")),
                Some('\\') => {
                    raw.push('\\');
                    self.advance();
                    if let Some(c) = self.peek(0) {
                        raw.push(c);
                        self.advance();
                    }
                }
                Some('"') => {
                    raw.push('"');
                    self.advance();
                    return Ok(());
                }
                Some(c) => {
                    raw.push(c);
                    self.advance();
                }
            }
        }
    }

    fn copy_nested_char(&mut self, open: Position, raw: &mut String) -> Result<(), Diagnostic> {
        raw.push('\'');
        self.advance();
        loop {
            match self.peek(0) {
                None => return Err(self.error_at(open, "unterminated char literal")),
                Some('\\') => {
                    raw.push('\\');
                    self.advance();
                    if let Some(c) = self.peek(0) {
                        raw.push(c);
                        self.advance();
                    }
                }
                Some('\'') => {
                    raw.push('\'');
                    self.advance();
                    return Ok(());
                }
                Some(c) => {
                    raw.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Validate one escape sequence and copy it raw.
    fn scan_escape(&mut self, raw: &mut String) -> Result<(), Diagnostic> {
        let at = self.position();
        raw.push('\\');
        self.advance();
        let c = match self.peek(0) {
            Some(c) => c,
            None => return Err(self.error_at(at, "incomplete escape sequence")),
        };
        match c {
            'n' | 't' | 'r' | '\\' | '"' | '\'' | '0' => {
                raw.push(c);
                self.advance();
                Ok(())
            }
            'x' => {
                raw.push(c);
                self.advance();
                self.scan_escape_digits(at, raw, 2)
            }
            'u' => {
                raw.push(c);
                self.advance();
                self.scan_escape_digits(at, raw, 4)
            }
            other => Err(self.error_at(at, format!("unknown escape sequence '\\{}'", other))),
        }
    }

    fn scan_escape_digits(
        &mut self,
        at: Position,
        raw: &mut String,
        count: usize,
    ) -> Result<(), Diagnostic> {
        for _ in 0..count {
            match self.peek(0) {
                Some(c) if c.is_ascii_hexdigit() => {
                    raw.push(c);
                    self.advance();
                }
                _ => return Err(self.error_at(at, "incomplete escape sequence")),
            }
        }
        Ok(())
    }

    fn scan_char(&mut self, start: Position) -> Result<Token, Diagnostic> {
        self.advance(); // opening quote
        let mut raw = String::new();
        match self.peek(0) {
            None | Some('\n') => {
                return Err(self.error_at(start, "unterminated char literal"));
            }
            Some('\\') => self.scan_escape(&mut raw)?,
            Some(c) => {
                raw.push(c);
                self.advance();
            }
        }
        if self.peek(0) != Some('\'') {
            return Err(self.error_at(start, "unterminated char literal"));
        }
        self.advance();
        Ok(Token::new(
            TokenKind::Char,
            raw,
            Span::new(start, self.position()),
        ))
    }

    // ------------------------------------------------------------------
    // Operators and punctuation
    // ------------------------------------------------------------------

    fn scan_operator(&mut self, start: Position) -> Result<Token, Diagnostic> {
        let c = self.peek(0).unwrap();

        // Two-character operators first: longest match wins.
        if let Some(next) = self.peek(1) {
            let two = match (c, next) {
                ('+', '+') => Some(TokenKind::PlusPlus),
                ('-', '-') => Some(TokenKind::MinusMinus),
                ('-', '>') => Some(TokenKind::Arrow),
                ('=', '=') => Some(TokenKind::EqualEqual),
                ('=', '>') => Some(TokenKind::FatArrow),
                ('!', '=') => Some(TokenKind::BangEqual),
                ('<', '=') => Some(TokenKind::LessEqual),
                ('<', '<') => Some(TokenKind::LShift),
                ('>', '=') => Some(TokenKind::GreaterEqual),
                ('>', '>') => Some(TokenKind::RShift),
                ('&', '&') => Some(TokenKind::AndAnd),
                ('|', '|') => Some(TokenKind::OrOr),
                _ => None,
            };
            if let Some(kind) = two {
                self.advance();
                self.advance();
                let mut lexeme = String::new();
                lexeme.push(c);
                lexeme.push(next);
                return Ok(Token::new(kind, lexeme, Span::new(start, self.position())));
            }
        }

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Assign,
            '!' => TokenKind::Bang,
            '<' => TokenKind::Less,
            '>' => TokenKind::Greater,
            '&' => TokenKind::Ampersand,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            '?' => TokenKind::Question,
            other => {
                return Err(
                    self.error_at(start, format!("unrecognized character '{}'", other))
                );
            }
        };
        self.advance();
        Ok(Token::new(
            kind,
            c.to_string(),
            Span::new(start, self.position()),
        ))
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Peek `n` runes ahead (0-based) through the lookahead cache.
    fn peek(&mut self, n: usize) -> Option<char> {
        debug_assert!(n < PEEK_CACHE_SIZE);
        if !self.cache_valid || self.cache_pos != self.pos {
            for (i, slot) in self.cache.iter_mut().enumerate() {
                *slot = self.chars.get(self.pos + i).copied();
            }
            self.cache_pos = self.pos;
            self.cache_valid = true;
        }
        self.cache[n]
    }

    fn advance(&mut self) {
        if let Some(&c) = self.chars.get(self.pos) {
            self.pos += 1;
            match c {
                '\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                '\t' => {
                    self.column = Position::new(self.line, self.column).next_tab_stop();
                }
                _ => self.column += 1,
            }
        }
        self.cache_valid = false;
    }

    fn error_at(&self, at: Position, message: impl Into<String>) -> Diagnostic {
        let source_line = self
            .lines
            .get((at.line - 1) as usize)
            .cloned()
            .unwrap_or_default();
        Diagnostic::error(
            self.file.clone(),
            "lex",
            message,
            Span::new(at, Position::new(at.line, at.column + 1)),
            source_line,
        )
    }
}

/// Normalize line endings to LF and drop a leading BOM.
fn normalize(source: &str) -> String {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, err) = Lexer::new("test.omni", source).lex_all();
        assert!(err.is_none(), "unexpected lex error: {:?}", err);
        tokens.iter().map(|t| t.kind).collect()
    }

    fn lex_err(source: &str) -> Diagnostic {
        let (_, err) = Lexer::new("test.omni", source).lex_all();
        err.expect("expected a lex error")
    }

    #[test]
    fn test_empty_input_is_single_eof() {
        let (tokens, err) = Lexer::new("test.omni", "").lex_all();
        assert!(err.is_none());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].span.start, Position::new(1, 1));
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("let x while While"),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::While,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_tab_advances_to_column_nine() {
        let (tokens, _) = Lexer::new("test.omni", "\tx").lex_all();
        assert_eq!(tokens[0].span.start, Position::new(1, 9));
    }

    #[test]
    fn test_crlf_and_bom_normalization() {
        let (tokens, err) = Lexer::new("test.omni", "\u{feff}a\r\nb").lex_all();
        assert!(err.is_none());
        assert_eq!(tokens[0].span.start, Position::new(1, 1));
        assert_eq!(tokens[1].span.start, Position::new(2, 1));
    }

    #[test]
    fn test_underscore_stripping() {
        let (tokens, _) = Lexer::new("test.omni", "1_000_000 0xDEAD_BEEF 0b10_10").lex_all();
        assert_eq!(tokens[0].lexeme, "1000000");
        assert_eq!(tokens[1].lexeme, "0xDEADBEEF");
        assert_eq!(tokens[1].kind, TokenKind::Hex);
        assert_eq!(tokens[2].lexeme, "0b1010");
        assert_eq!(tokens[2].kind, TokenKind::Binary);
    }

    #[test]
    fn test_bad_underscores_are_errors() {
        assert!(lex_err("0x__").message.contains("underscore"));
        assert!(lex_err("1__2").message.contains("underscore"));
        assert!(lex_err("1_").message.contains("underscore"));
    }

    #[test]
    fn test_exponent_without_digits() {
        let diag = lex_err("1e+");
        assert!(diag.message.contains("exponent"));
        assert_eq!(
            diag.hint.as_deref(),
            Some("exponent must be followed by at least one digit")
        );
    }

    #[test]
    fn test_float_vs_method_dot() {
        assert_eq!(
            kinds("1.5 1.foo"),
            vec![
                TokenKind::Float,
                TokenKind::Int,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_nested_block_comment() {
        assert_eq!(kinds("/* /* */ */ x"), vec![TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn test_unterminated_block_comment_reports_opener() {
        let diag = lex_err("ab\n  /* nope");
        assert_eq!(diag.span.start, Position::new(2, 3));
        assert!(diag.message.contains("unterminated"));
    }

    #[test]
    fn test_string_and_escapes() {
        let (tokens, _) = Lexer::new("test.omni", r#""a\n\x41Ab""#).lex_all();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, r"a\n\x41Ab");
    }

    #[test]
    fn test_unknown_escape_is_error() {
        let diag = lex_err(r#""a\qb""#);
        assert!(diag.message.contains("escape"));
    }

    #[test]
    fn test_partial_hex_escape_is_error() {
        assert!(lex_err(r#""\x4""#).message.contains("escape"));
        assert!(lex_err(r#""\u00""#).message.contains("escape"));
    }

    #[test]
    fn test_unterminated_string_points_at_opening() {
        let diag = lex_err("let s = \"abc\nx");
        assert_eq!(diag.span.start, Position::new(1, 9));
    }

    #[test]
    fn test_interpolation_becomes_interp_token() {
        let (tokens, _) = Lexer::new("test.omni", r#""a ${1 + 2} b""#).lex_all();
        assert_eq!(tokens[0].kind, TokenKind::StringInterp);
        assert_eq!(tokens[0].lexeme, "a ${1 + 2} b");
    }

    #[test]
    fn test_interpolation_tracks_nested_braces_and_strings() {
        let (tokens, _) = Lexer::new("test.omni", r#""x ${ m["}"] } y""#).lex_all();
        assert_eq!(tokens[0].kind, TokenKind::StringInterp);
        assert_eq!(tokens[0].lexeme, r#"x ${ m["}"] } y"#);
    }

    #[test]
    fn test_char_literal() {
        let (tokens, _) = Lexer::new("test.omni", r"'a' '\n'").lex_all();
        assert_eq!(tokens[0].kind, TokenKind::Char);
        assert_eq!(tokens[0].lexeme, "a");
        assert_eq!(tokens[1].lexeme, r"\n");
    }

    #[test]
    fn test_longest_match_operators() {
        assert_eq!(
            kinds("++ -- -> => == != <= >= << >> && || < > ="),
            vec![
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::Arrow,
                TokenKind::FatArrow,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::LShift,
                TokenKind::RShift,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Assign,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unrecognized_character() {
        let diag = lex_err("let @ = 1");
        assert!(diag.message.contains("unrecognized"));
        assert_eq!(diag.span.start, Position::new(1, 5));
    }

    #[test]
    fn test_lex_all_keeps_partial_tokens_on_error() {
        let (tokens, err) = Lexer::new("test.omni", "let x = \"oops").lex_all();
        assert!(err.is_some());
        assert_eq!(tokens.len(), 3); // let, x, =
    }

    #[test]
    fn test_unicode_identifier_nfc() {
        // "é" composed vs decomposed lexes to the same NFC lexeme.
        let (composed, _) = Lexer::new("t", "caf\u{e9}").lex_all();
        let (decomposed, _) = Lexer::new("t", "cafe\u{301}").lex_all();
        assert_eq!(composed[0].lexeme, decomposed[0].lexeme);
    }

    #[test]
    fn test_spans_are_half_open() {
        let (tokens, _) = Lexer::new("test.omni", "abc").lex_all();
        assert_eq!(tokens[0].span.start, Position::new(1, 1));
        assert_eq!(tokens[0].span.end, Position::new(1, 4));
    }
}
