//! MySQL tokenizer implementation.

use super::{Keyword, Span, Token, TokenKind};

/// A lexer that tokenizes one MySQL statement.
///
/// Executable comments (`/*!50100 ... */`, `/*M! ... */`) are lexed as
/// code, matching what the server does with them; every other comment is
/// skipped.
pub struct Lexer<'a> {
    /// The statement text.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
    /// Number of executable comments currently open.
    open_executable_comments: usize,
}

const fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || !c.is_ascii()
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
            open_executable_comments: 0,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the character after the current one without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Returns the character two places ahead without advancing.
    fn peek_third(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_line(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }

    /// Skips whitespace, comments, and the markers of executable comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            match (self.peek(), self.peek_next()) {
                (Some('-'), Some('-')) | (Some('#'), _) => {
                    self.skip_line();
                }
                (Some('*'), Some('/')) if self.open_executable_comments > 0 => {
                    self.advance();
                    self.advance();
                    self.open_executable_comments -= 1;
                }
                (Some('/'), Some('*')) => {
                    self.advance(); // /
                    self.advance(); // *
                    if self.enter_executable_comment() {
                        continue;
                    }
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            None => break,
                            _ => {}
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Consumes a `!` or `M!` marker and its version digits after `/*`.
    fn enter_executable_comment(&mut self) -> bool {
        let marker = match (self.peek(), self.peek_next()) {
            (Some('!'), _) => 1,
            (Some('M'), Some('!')) => 2,
            _ => return false,
        };
        for _ in 0..marker {
            self.advance();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        self.open_executable_comments += 1;
        true
    }

    /// Creates a span from start to current position.
    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    /// Creates a token with the current span.
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    /// Scans an identifier or keyword starting at `self.start`.
    fn scan_identifier(&mut self) -> Token {
        while self.peek().is_some_and(is_identifier_char) {
            self.advance();
        }

        let text = &self.input[self.start..self.pos];
        match Keyword::from_str(text) {
            Some(keyword) => self.make_token(TokenKind::Keyword(keyword)),
            None => self.make_token(TokenKind::Identifier(text.to_string())),
        }
    }

    /// Scans a backquoted identifier; a doubled backquote is a literal one.
    fn scan_quoted_identifier(&mut self) -> Token {
        self.advance(); // opening `
        let mut name = String::new();

        loop {
            match self.advance() {
                Some('`') if self.peek() == Some('`') => {
                    self.advance();
                    name.push('`');
                }
                Some('`') => break,
                Some(c) => name.push(c),
                None => {
                    return self.make_token(TokenKind::Error(String::from(
                        "Unterminated quoted identifier",
                    )));
                }
            }
        }

        self.make_token(TokenKind::Identifier(name))
    }

    /// Scans a number, or an identifier that starts with digits such as
    /// `20151214foo`.
    fn scan_number(&mut self) -> Token {
        let mut is_float = false;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            let exponent_follows = match self.peek_next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.peek_third().is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if !exponent_follows {
                return self.scan_identifier();
            }
        } else if self.peek().is_some_and(is_identifier_char) {
            return self.scan_identifier();
        }

        if self.peek() == Some('.') {
            match self.peek_next() {
                Some(c) if c.is_ascii_digit() => {
                    is_float = true;
                    self.advance(); // .
                    while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        self.advance();
                    }
                }
                Some(c) if is_identifier_char(c) || c == '`' => {}
                _ => {
                    // `-1.` is a valid float literal
                    is_float = true;
                    self.advance();
                }
            }
        }

        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            is_float = true;
            self.advance(); // e/E
            if self.peek().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = &self.input[self.start..self.pos];
        if is_float {
            match text.parse::<f64>() {
                Ok(f) => self.make_token(TokenKind::Float(f)),
                Err(e) => self.make_token(TokenKind::Error(format!("Invalid float: {e}"))),
            }
        } else {
            match text.parse::<u64>() {
                Ok(i) => self.make_token(TokenKind::Integer(i)),
                Err(_) => match text.parse::<f64>() {
                    Ok(f) => self.make_token(TokenKind::Float(f)),
                    Err(e) => self.make_token(TokenKind::Error(format!("Invalid integer: {e}"))),
                },
            }
        }
    }

    /// Scans a quoted string, resolving backslash escapes and doubled
    /// quotes.
    fn scan_string(&mut self, quote: char) -> Token {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.advance() {
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.advance();
                        value.push(quote);
                    } else {
                        break;
                    }
                }
                Some('\\') => match self.advance() {
                    Some('0') => value.push('\0'),
                    Some('b') => value.push('\u{8}'),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('Z') => value.push('\u{1a}'),
                    Some(c @ ('%' | '_')) => {
                        value.push('\\');
                        value.push(c);
                    }
                    Some(c) => value.push(c),
                    None => break,
                },
                Some(c) => value.push(c),
                None => {
                    return self.make_token(TokenKind::Error(String::from(
                        "Unterminated string literal",
                    )));
                }
            }
        }

        if quote == '"' {
            self.make_token(TokenKind::DoubleQuoted(value))
        } else {
            self.make_token(TokenKind::String(value))
        }
    }

    /// Scans `X'..'` after the prefix has been consumed.
    fn scan_hex_string(&mut self) -> Token {
        self.advance(); // opening quote
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c != '\'') {
            self.advance();
        }
        if self.peek().is_none() {
            return self.make_token(TokenKind::Error(String::from("Unterminated hex literal")));
        }
        let digits = &self.input[digits_start..self.pos];
        self.advance(); // closing quote
        self.hex_token(digits)
    }

    fn hex_token(&self, digits: &str) -> Token {
        match hex::decode(digits) {
            Ok(bytes) => self.make_token(TokenKind::HexLiteral(bytes)),
            Err(e) => self.make_token(TokenKind::Error(format!("Invalid hex literal: {e}"))),
        }
    }

    /// Scans `B'..'` after the prefix has been consumed.
    fn scan_bit_string(&mut self) -> Token {
        self.advance(); // opening quote
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c == '0' || c == '1') {
            self.advance();
        }
        let digits = self.input[digits_start..self.pos].to_string();
        if self.advance() != Some('\'') {
            return self.make_token(TokenKind::Error(String::from("Invalid bit literal")));
        }
        self.make_token(TokenKind::BitLiteral(digits))
    }

    /// Scans `0x..` and `0b..` literals; falls back to a number or an
    /// identifier when the digits do not fit the radix.
    fn scan_prefixed_number(&mut self, radix: char) -> Token {
        let save = self.pos;
        self.advance(); // 0
        self.advance(); // x / b
        let digits_start = self.pos;
        while self.peek().is_some_and(is_identifier_char) {
            self.advance();
        }
        let digits = &self.input[digits_start..self.pos];
        let valid = !digits.is_empty()
            && match radix {
                'x' => digits.chars().all(|c| c.is_ascii_hexdigit()),
                _ => digits.chars().all(|c| c == '0' || c == '1'),
            };
        if !valid {
            self.pos = save;
            return self.scan_number();
        }
        if radix == 'x' {
            let padded = if digits.len() % 2 == 1 {
                format!("0{digits}")
            } else {
                digits.to_string()
            };
            self.hex_token(&padded)
        } else {
            self.make_token(TokenKind::BitLiteral(digits.to_string()))
        }
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start = self.pos;

        let Some(c) = self.peek() else {
            return self.make_token(TokenKind::Eof);
        };

        match c {
            '\'' | '"' => return self.scan_string(c),
            '`' => return self.scan_quoted_identifier(),
            'x' | 'X' if self.peek_next() == Some('\'') => {
                self.advance();
                return self.scan_hex_string();
            }
            'b' | 'B' if self.peek_next() == Some('\'') => {
                self.advance();
                return self.scan_bit_string();
            }
            'n' | 'N' if self.peek_next() == Some('\'') => {
                self.advance();
                self.start = self.pos;
                return self.scan_string('\'');
            }
            '0' if matches!(self.peek_next(), Some('x' | 'b')) => {
                let radix = self.peek_next().unwrap_or('x');
                return self.scan_prefixed_number(radix);
            }
            c if c.is_ascii_digit() => return self.scan_number(),
            c if is_identifier_char(c) => return self.scan_identifier(),
            _ => {}
        }

        self.advance();
        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,
            '@' => TokenKind::At,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '~' => TokenKind::BitNot,
            '&' => TokenKind::BitAnd,
            '|' => TokenKind::BitOr,
            '=' => TokenKind::Eq,
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => match self.peek() {
                Some('=') => {
                    self.advance();
                    TokenKind::LtEq
                }
                Some('>') => {
                    self.advance();
                    TokenKind::NotEq
                }
                _ => TokenKind::Lt,
            },
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            _ => TokenKind::Error(format!("Unexpected character: {c}")),
        };
        self.make_token(kind)
    }

    /// Tokenizes the entire input and returns all tokens, ending with EOF.
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}
