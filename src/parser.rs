//! Parser for Firefox default preference files
//!
//! The files that populate the default branch (`greprefs.js` and
//! `defaults/pref/*.js` inside `omni.ja`) are sequences of statements:
//!
//! ```text
//! pref("preference.name", value);
//! pref("preference.name", value, sticky);    // sticky default
//! pref("preference.name", value, locked);    // locked default
//! sticky_pref("preference.name", value);
//! lock_pref("preference.name", value);
//! user_pref("preference.name", value);       // user branch, not a default
//! ```
//!
//! # Example
//!
//! ```rust
//! use ffdiff::{parse_prefs_js, PrefKind, PrefValue};
//!
//! let content = r#"
//!     // This is a comment
//!     pref("browser.startup.page", 1);
//!     pref("javascript.enabled", true, locked);
//! "#;
//!
//! let prefs = parse_prefs_js(content)?;
//! assert_eq!(prefs[0].value, PrefValue::int(1));
//! assert_eq!(prefs[1].kind, PrefKind::Locked);
//! # Ok::<(), ffdiff::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token};
use crate::types::{PrefEntry, PrefValue};

/// How a statement assigns its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefKind {
    /// `pref(...)`
    Default,
    /// `sticky_pref(...)` or `pref(..., sticky)`
    Sticky,
    /// `lock_pref(...)` or `pref(..., locked)`
    Locked,
    /// `user_pref(...)`; assigns the user branch
    User,
}

impl PrefKind {
    /// Whether the statement sets a value on the default branch
    pub fn is_default_branch(self) -> bool {
        self != PrefKind::User
    }
}

/// A parsed preference statement
#[derive(Debug, Clone, PartialEq)]
pub struct PrefStatement {
    pub key: String,
    pub value: PrefValue,
    pub kind: PrefKind,
}

/// Parse every statement of a preference file
pub fn parse_prefs_js(content: &str) -> Result<Vec<PrefStatement>> {
    Parser::new(content)?.parse()
}

/// Parse a preference file and keep the default-branch values in order
///
/// `user_pref` statements are skipped. Later statements for the same key
/// override earlier ones once collected into a [`crate::Registry`].
pub fn parse_default_prefs(content: &str) -> Result<Vec<PrefEntry>> {
    Ok(parse_prefs_js(content)?
        .into_iter()
        .filter(|statement| statement.kind.is_default_branch())
        .map(|statement| PrefEntry {
            key: statement.key,
            value: statement.value,
        })
        .collect())
}

/// Recursive descent parser over the lexer's tokens
struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Current lookahead token
    current: Token,
    /// Position of the lookahead token
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        let (line, column) = lexer.token_start();
        Ok(Parser {
            lexer,
            current,
            line,
            column,
        })
    }

    fn parse(&mut self) -> Result<Vec<PrefStatement>> {
        let mut statements = Vec::new();
        while self.current != Token::Eof {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    /// Error at the lookahead token
    fn error(&self, message: String) -> Error {
        self.error_at((self.line, self.column), message)
    }

    fn error_at(&self, (line, column): (usize, usize), message: String) -> Error {
        Error::Parser {
            line,
            column,
            message,
        }
    }

    fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    /// Replace the lookahead with the next token and return the old one
    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        let (line, column) = self.lexer.token_start();
        self.line = line;
        self.column = column;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        if self.current != expected {
            return Err(self.error(format!("Expected {:?}, got {:?}", expected, self.current)));
        }
        self.advance()?;
        Ok(())
    }

    /// statement := function "(" string "," value ("," attribute)* ")" ";"
    fn parse_statement(&mut self) -> Result<PrefStatement> {
        let mut kind = self.parse_function()?;
        self.expect(Token::LeftParen)?;

        let at = self.position();
        let key = match self.advance()? {
            Token::String(key) => key,
            other => {
                return Err(self.error_at(
                    at,
                    format!("Expected preference name string, got {:?}", other),
                ))
            }
        };
        self.expect(Token::Comma)?;

        let at = self.position();
        let value = match self.advance()? {
            Token::String(s) => PrefValue::String(s),
            Token::Number(n) => PrefValue::Number(n),
            Token::Boolean(b) => PrefValue::Bool(b),
            other => return Err(self.error_at(at, format!("Expected value, got {:?}", other))),
        };

        while self.current == Token::Comma {
            self.advance()?;
            let at = self.position();
            let attribute = match self.advance()? {
                Token::Identifier(attribute) => attribute,
                other => {
                    return Err(self.error_at(at, format!("Expected attribute, got {:?}", other)))
                }
            };
            kind = match (attribute.as_str(), kind) {
                ("sticky", PrefKind::Default) => PrefKind::Sticky,
                ("sticky", kind) => kind,
                ("locked", PrefKind::User) => PrefKind::User,
                ("locked", _) => PrefKind::Locked,
                (other, _) => {
                    return Err(self.error_at(at, format!(
                        "Unknown attribute '{}'. Expected sticky or locked",
                        other
                    )))
                }
            };
        }

        self.expect(Token::RightParen)?;
        self.expect(Token::Semicolon)?;

        Ok(PrefStatement { key, value, kind })
    }

    fn parse_function(&mut self) -> Result<PrefKind> {
        let kind = match &self.current {
            Token::Identifier(name) => match name.as_str() {
                "pref" => PrefKind::Default,
                "sticky_pref" => PrefKind::Sticky,
                "lock_pref" => PrefKind::Locked,
                "user_pref" => PrefKind::User,
                _ => {
                    return Err(self.error(format!(
                        "Unknown pref function '{}'. Expected pref, sticky_pref, lock_pref or user_pref",
                        name
                    )))
                }
            },
            other => {
                return Err(self.error(format!("Expected pref function name, got {:?}", other)))
            }
        };
        self.advance()?;
        Ok(kind)
    }
}
