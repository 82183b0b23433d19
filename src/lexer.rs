//! Lexer for Firefox default preference files
//!
//! Tokenizes the dialect of `greprefs.js` and the `defaults/pref/*.js`
//! files shipped in `omni.ja`: C and C++ comments plus `#` line comments,
//! single- or double-quoted strings with JavaScript escapes, signed numbers
//! and bare identifiers. Every token records the line and column where it
//! starts so the parser can report precise errors.

use crate::error::{Error, Result};
use std::iter::Peekable;
use std::str::Chars;

/// Token types produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier (`pref`, `sticky_pref`, `lock_pref`, `user_pref`, or an
    /// attribute such as `locked`)
    Identifier(String),
    /// String value with escape sequences already processed
    String(String),
    /// Numeric value
    Number(f64),
    /// Boolean value
    Boolean(bool),
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    /// End of input
    Eof,
}

/// Lexer for tokenizing default preference files
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Position where the last returned token started
    token_line: usize,
    token_column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input
    pub fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
            token_line: 1,
            token_column: 1,
        }
    }

    /// Line and column where the last returned token started
    pub fn token_start(&self) -> (usize, usize) {
        (self.token_line, self.token_column)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia()?;
        self.token_line = self.line;
        self.token_column = self.column;

        let Some(&c) = self.chars.peek() else {
            return Ok(Token::Eof);
        };

        let single = match c {
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            _ => None,
        };
        if let Some(token) = single {
            self.bump();
            return Ok(token);
        }

        match c {
            '"' | '\'' => self.lex_string(c),
            '-' | '+' | '0'..='9' => self.lex_number(),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.lex_identifier()),
            _ => Err(self.error(format!("Unexpected character: '{}'", c))),
        }
    }

    /// Consume one character, keeping line and column up to date
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

    fn error(&self, message: String) -> Error {
        Error::Lexer {
            line: self.line,
            column: self.column,
            message,
        }
    }

    fn skip_line(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    /// Skip whitespace, `//`, `/* */` and `#` comments
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => self.skip_line(),
                Some('/') => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    match self.bump() {
                        Some('/') => self.skip_line(),
                        Some('*') => {
                            let mut previous = '\0';
                            loop {
                                match self.bump() {
                                    Some('/') if previous == '*' => break,
                                    Some(c) => previous = c,
                                    None => {
                                        return Err(Error::Lexer {
                                            line,
                                            column,
                                            message: "Unterminated block comment".to_string(),
                                        })
                                    }
                                }
                            }
                        }
                        _ => {
                            return Err(Error::Lexer {
                                line,
                                column,
                                message: "Unexpected character: '/'".to_string(),
                            })
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Lex an identifier; `true` and `false` become booleans
    fn lex_identifier(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            _ => Token::Identifier(ident),
        }
    }

    /// Read exactly `count` hex digits
    fn hex_digits(&mut self, count: usize) -> Result<u32> {
        let mut value = 0;
        for _ in 0..count {
            let digit = self
                .chars
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error(format!("Expected {} hex digits in escape", count)))?;
            self.bump();
            value = value * 16 + digit;
        }
        Ok(value)
    }

    /// Decode a `\uXXXX` escape, joining UTF-16 surrogate pairs
    fn unicode_escape(&mut self) -> Result<char> {
        let high = self.hex_digits(4)?;
        if !(0xD800..0xDC00).contains(&high) {
            return Ok(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER));
        }

        let mut lookahead = self.chars.clone();
        if lookahead.next() != Some('\\') || lookahead.next() != Some('u') {
            return Ok(char::REPLACEMENT_CHARACTER);
        }
        self.bump();
        self.bump();
        let low = self.hex_digits(4)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Ok(char::REPLACEMENT_CHARACTER);
        }
        let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        Ok(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Lex a string literal delimited by `quote`
    fn lex_string(&mut self, quote: char) -> Result<Token> {
        let (line, column) = (self.line, self.column);
        self.bump();

        let mut result = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(Token::String(result)),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('b') => '\x08',
                        Some('f') => '\x0c',
                        Some('0') => '\0',
                        Some('x') => {
                            let byte = self.hex_digits(2)?;
                            char::from_u32(byte).unwrap_or(char::REPLACEMENT_CHARACTER)
                        }
                        Some('u') => self.unicode_escape()?,
                        Some(c) => return Err(self.error(format!("Invalid escape sequence: \\{}", c))),
                        None => {
                            return Err(self.error("Unexpected end of input in escape sequence".to_string()))
                        }
                    };
                    result.push(escaped);
                }
                Some(c) => result.push(c),
                None => {
                    return Err(Error::Lexer {
                        line,
                        column,
                        message: "Unterminated string literal".to_string(),
                    })
                }
            }
        }
    }

    fn take_digits(&mut self, into: &mut String) -> usize {
        let mut count = 0;
        while let Some(&c) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            into.push(c);
            self.bump();
            count += 1;
        }
        count
    }

    /// Lex a number with optional sign, fraction and exponent
    fn lex_number(&mut self) -> Result<Token> {
        let mut text = String::new();

        if let Some(&sign) = self.chars.peek().filter(|c| matches!(**c, '-' | '+')) {
            if sign == '-' {
                text.push('-');
            }
            self.bump();
        }

        let mut digits = self.take_digits(&mut text);
        if let Some(&'.') = self.chars.peek() {
            text.push('.');
            self.bump();
            digits += self.take_digits(&mut text);
        }
        if digits == 0 {
            return Err(self.error("Expected digits in number".to_string()));
        }

        if let Some(&('e' | 'E')) = self.chars.peek() {
            text.push('e');
            self.bump();
            if let Some(&sign) = self.chars.peek().filter(|c| matches!(**c, '-' | '+')) {
                text.push(sign);
                self.bump();
            }
            if self.take_digits(&mut text) == 0 {
                return Err(self.error("Missing exponent digits in scientific notation".to_string()));
            }
        }

        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| self.error(format!("Failed to parse number: {}", text)))
    }
}
