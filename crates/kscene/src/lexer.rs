//! Tokenizer for scene sources
//!
//! Whitespace and newlines carry no meaning, statements are separated purely by their structure.
//! `#` and `//` start comments running until the end of the line.

use crate::error::{Location, SyntaxError};
use kscene_utils::EscapeDisplay;
use std::{fmt, iter::Peekable, str::Chars};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Number(f32),

    Dot,       // .
    Comma,     // ,
    Equals,    // =
    Colon,     // :
    Semicolon, // ;
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "`{}`", EscapeDisplay(name)),
            TokenKind::Str(s) => write!(f, "string \"{}\"", EscapeDisplay(s)),
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::Dot => f.write_str("`.`"),
            TokenKind::Comma => f.write_str("`,`"),
            TokenKind::Equals => f.write_str("`=`"),
            TokenKind::Colon => f.write_str("`:`"),
            TokenKind::Semicolon => f.write_str("`;`"),
            TokenKind::LParen => f.write_str("`(`"),
            TokenKind::RParen => f.write_str("`)`"),
            TokenKind::LBracket => f.write_str("`[`"),
            TokenKind::RBracket => f.write_str("`]`"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenizes the whole source. The returned list always ends with a [`TokenKind::Eof`].
    pub fn tokenize(src: &'a str) -> Result<Vec<Token>, SyntaxError> {
        let mut lexer = Self::new(src);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_line(&mut self) {
        while matches!(self.peek(), Some(c) if c != '\n') {
            self.bump();
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => self.skip_line(),
                Some('/') => {
                    // `//` comment, a lone slash is left for the tokenizer to reject
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.next() == Some('/') {
                        self.skip_line();
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_trivia();

        let location = self.location();
        let Some(c) = self.bump() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                location,
            });
        };

        let kind = match c {
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            '=' => TokenKind::Equals,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,

            '"' | '\'' => TokenKind::Str(self.string(c, location)?),

            c if c.is_ascii_digit() || c == '-' || c == '+' => {
                TokenKind::Number(self.number(c, location)?)
            }

            c if c.is_alphabetic() || c == '_' => {
                let mut s = String::from(c);
                while let Some(p) = self.peek() {
                    if !(p.is_alphanumeric() || p == '_') {
                        break;
                    }
                    s.push(p);
                    self.bump();
                }
                TokenKind::Ident(s)
            }

            other => {
                return Err(SyntaxError::new(
                    location,
                    format_args!("unexpected character `{}`", other.escape_default()),
                ))
            }
        };

        Ok(Token { kind, location })
    }

    fn string(&mut self, quote: char, start: Location) -> Result<String, SyntaxError> {
        let mut result = String::new();
        loop {
            let escape_location = self.location();
            match self.bump() {
                None | Some('\n') => {
                    return Err(SyntaxError::new(start, "unterminated string"));
                }
                Some(c) if c == quote => return Ok(result),
                Some('\\') => match self.bump() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some(c @ ('\\' | '"' | '\'')) => result.push(c),
                    Some(other) => {
                        return Err(SyntaxError::new(
                            escape_location,
                            format_args!("unknown escape sequence `\\{}`", other.escape_default()),
                        ))
                    }
                    None => return Err(SyntaxError::new(start, "unterminated string")),
                },
                Some(c) => result.push(c),
            }
        }
    }

    fn number(&mut self, first: char, start: Location) -> Result<f32, SyntaxError> {
        let mut text = String::from(first);

        let take_digits = |lexer: &mut Self, text: &mut String| {
            let mut any = false;
            while let Some(c) = lexer.peek().filter(char::is_ascii_digit) {
                text.push(c);
                lexer.bump();
                any = true;
            }
            any
        };

        let mut has_digits = first.is_ascii_digit();
        has_digits |= take_digits(self, &mut text);

        // Only treat the dot as a fraction if a digit follows, so `1.` stays a number followed by
        // whatever comes after the dot
        if self.peek() == Some('.') {
            let mut ahead = self.chars.clone();
            ahead.next();
            if ahead.peek().map_or(false, char::is_ascii_digit) {
                text.push('.');
                self.bump();
                has_digits |= take_digits(self, &mut text);
            }
        }

        if !has_digits {
            return Err(SyntaxError::new(
                start,
                format_args!("expected a number after `{first}`"),
            ));
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            text.push('e');
            self.bump();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.bump();
            }
            if !take_digits(self, &mut text) {
                return Err(SyntaxError::new(start, "expected digits in number exponent"));
            }
        }

        text.parse::<f32>()
            .map_err(|err| SyntaxError::new(start, format_args!("invalid number `{text}`: {err}")))
    }
}
