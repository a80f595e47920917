//! Tokenizer for USD ASCII layers.

use robot_types::{NormalizeError, Result};

/// Token kinds of the `.usda` text format.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Keyword, type name or property name (`def`, `double3`, `xformOp:translate`).
    Ident(String),
    /// Quoted string, single, double or triple quoted.
    Str(String),
    /// Asset path, `@./mesh.usd@`.
    Asset(String),
    /// Scene path, `</robot/base_link>`.
    Path(String),
    /// Numeric literal.
    Number(f64),
    /// One of `( ) [ ] { } = , ; :`.
    Punct(char),
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Short description used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(s) => format!("'{s}'"),
            Self::Str(s) => format!("string \"{s}\""),
            Self::Asset(s) => format!("asset @{s}@"),
            Self::Path(s) => format!("path <{s}>"),
            Self::Number(n) => format!("number {n}"),
            Self::Punct(c) => format!("'{c}'"),
            Self::Eof => "end of file".to_string(),
        }
    }
}

/// A token and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What was read.
    pub kind: TokenKind,
    /// One-based line number.
    pub line: usize,
}

/// Split a layer into tokens. The input must start with a `#usda` header.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let body = source.strip_prefix('\u{feff}').unwrap_or(source);
    if !body.starts_with("#usda") {
        return Err(NormalizeError::format_at(
            "USD layer must start with a '#usda' header",
            1,
        ));
    }
    Lexer {
        chars: body.chars().collect(),
        pos: 0,
        line: 1,
    }
    .run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let line = self.line;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line,
                });
                return Ok(tokens);
            };
            let kind = match c {
                '"' | '\'' => TokenKind::Str(self.string(c)?),
                '@' => TokenKind::Asset(self.delimited('@', '@', "asset path")?),
                '<' => TokenKind::Path(self.delimited('<', '>', "path")?),
                '(' | ')' | '[' | ']' | '{' | '}' | '=' | ',' | ';' | ':' => {
                    self.bump();
                    TokenKind::Punct(c)
                }
                c if c.is_ascii_digit() || self.starts_number() => self.number()?,
                c if c.is_alphabetic() || c == '_' => TokenKind::Ident(self.ident()),
                c => {
                    return Err(NormalizeError::format_at(
                        format!("unexpected character '{c}'"),
                        line,
                    ));
                }
            };
            tokens.push(Token { kind, line });
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c == '#' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.bump();
                }
            } else if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn starts_number(&self) -> bool {
        match self.peek() {
            Some('-' | '+') => {
                self.peek_at(1).is_some_and(|c| c.is_ascii_digit() || c == '.')
                    || self.peek_at(1) == Some('i')
            }
            Some('.') => self.peek_at(1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn number(&mut self) -> Result<TokenKind> {
        let line = self.line;
        let mut text = String::new();
        if let Some(sign @ ('-' | '+')) = self.peek() {
            text.push(sign);
            self.bump();
            if self.starts_with("inf") {
                self.pos += 3;
                return Ok(TokenKind::Number(if sign == '-' {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }));
            }
        }
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '-' || c == '+') && text.ends_with(['e', 'E']);
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| NormalizeError::format_at(format!("invalid number '{text}'"), line))
    }

    fn ident(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' || (c == ':' && self.ident_continues()) {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        text
    }

    /// A `:` inside a namespaced name is part of it; a trailing one is punctuation.
    fn ident_continues(&self) -> bool {
        self.peek_at(1).is_some_and(|c| c.is_alphabetic() || c == '_')
    }

    fn string(&mut self, quote: char) -> Result<String> {
        let line = self.line;
        let triple: String = [quote; 3].iter().collect();
        if self.starts_with(&triple) {
            self.pos += 3;
            let mut text = String::new();
            loop {
                if self.starts_with(&triple) {
                    self.pos += 3;
                    return Ok(text);
                }
                match self.bump() {
                    Some(c) => text.push(c),
                    None => {
                        return Err(NormalizeError::format_at("unterminated string", line));
                    }
                }
            }
        }

        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(text),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None => break,
                },
                Some('\n') | None => break,
                Some(c) => text.push(c),
            }
        }
        Err(NormalizeError::format_at("unterminated string", line))
    }

    fn delimited(&mut self, open: char, close: char, what: &str) -> Result<String> {
        let line = self.line;
        debug_assert_eq!(self.peek(), Some(open));
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some(c) if c == close => return Ok(text),
                Some('\n') | None => {
                    return Err(NormalizeError::format_at(format!("unterminated {what}"), line));
                }
                Some(c) => text.push(c),
            }
        }
    }
}
