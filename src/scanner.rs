//! Statement scanner for user.js files
//!
//! This module finds `user_pref(...)` statements in arbitrary user.js text
//! and splits each one into its raw parts: the key, the unparsed value text
//! and the trailing `//` comment. It does not interpret values or comments;
//! that is left to [`crate::annotations`].
//!
//! The scanner never fails. Text that does not form a complete statement is
//! skipped and scanning resumes after the keyword that started it.

/// Keyword that introduces an assignment in user.js
pub const USER_PREF_KEYWORD: &str = "user_pref(";

/// A raw `user_pref` statement
#[derive(Debug, Clone, PartialEq)]
pub struct Statement<'a> {
    /// Key without its quotes
    pub key: &'a str,
    /// Value text between the comma and the closing parenthesis, trimmed
    pub raw_value: &'a str,
    /// Trailing comment text after `//`, trimmed (empty if absent)
    pub comment: &'a str,
    /// Line of the keyword (1-indexed)
    pub line: usize,
}

/// Iterator over the `user_pref` statements of a document
pub struct Scanner<'a> {
    /// Full input text
    input: &'a str,
    /// Byte offset where the next search starts
    pos: usize,
    /// Line number at `line_pos` (1-indexed)
    line: usize,
    /// Byte offset up to which newlines have been counted
    line_pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    pub fn new(input: &'a str) -> Self {
        Scanner {
            input,
            pos: 0,
            line: 1,
            line_pos: 0,
        }
    }

    /// Line number of a byte offset at or after `line_pos`
    fn line_at(&mut self, offset: usize) -> usize {
        self.line += self.input.as_bytes()[self.line_pos..offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.line_pos = offset;
        self.line
    }

    /// Try to read a full statement whose keyword ends at `start`
    ///
    /// Returns the statement and the offset right after it.
    fn statement_at(&self, start: usize) -> Option<(&'a str, &'a str, &'a str, usize)> {
        let mut cursor = Cursor::new(self.input, start);

        cursor.skip_whitespace();
        let key = cursor.quoted_key()?;
        cursor.skip_whitespace();
        cursor.expect(b',')?;

        let value_start = cursor.pos;
        let value_end = cursor.value_end()?;
        let raw_value = self.input[value_start..value_end].trim();
        cursor.pos = value_end + 1;

        let mut end = cursor.pos;
        cursor.skip_blanks();
        if cursor.peek() == Some(b';') {
            cursor.pos += 1;
            end = cursor.pos;
            cursor.skip_blanks();
        }

        let mut comment = "";
        if self.input[cursor.pos..].starts_with("//") {
            let comment_start = cursor.pos + 2;
            let comment_end = self.input[comment_start..]
                .find('\n')
                .map_or(self.input.len(), |i| comment_start + i);
            comment = self.input[comment_start..comment_end].trim();
            end = comment_end;
        }

        Some((key, raw_value, comment, end))
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Statement<'a>;

    fn next(&mut self) -> Option<Statement<'a>> {
        while self.pos < self.input.len() {
            let Some(found) = self.input[self.pos..].find(USER_PREF_KEYWORD) else {
                self.pos = self.input.len();
                return None;
            };
            let start = self.pos + found;
            let after_keyword = start + USER_PREF_KEYWORD.len();

            // `myuser_pref(` is not the keyword
            let preceded_by_ident = self.input[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
            if preceded_by_ident {
                self.pos = after_keyword;
                continue;
            }

            match self.statement_at(after_keyword) {
                Some((key, raw_value, comment, end)) => {
                    let line = self.line_at(start);
                    self.pos = end;
                    return Some(Statement {
                        key,
                        raw_value,
                        comment,
                        line,
                    });
                }
                None => self.pos = after_keyword,
            }
        }
        None
    }
}

/// Byte cursor over the input; all delimiters it looks for are ASCII
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, pos: usize) -> Self {
        Cursor { input, pos }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Skip whitespace including newlines
    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == 0x0b {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Skip spaces and tabs only
    fn skip_blanks(&mut self) {
        while let Some(b' ' | b'\t') = self.peek() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: u8) -> Option<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    /// Read a non-empty key quoted with `"` or `'`
    ///
    /// The key may not contain either quote character. The closing quote
    /// can be either one, whatever the opening quote was.
    fn quoted_key(&mut self) -> Option<&'a str> {
        if !matches!(self.peek()?, b'"' | b'\'') {
            return None;
        }
        let start = self.pos + 1;
        let len = self.input.as_bytes()[start..]
            .iter()
            .position(|&b| b == b'"' || b == b'\'')?;
        if len == 0 {
            return None;
        }
        self.pos = start + len + 1;
        Some(&self.input[start..start + len])
    }

    /// Offset of the `)` closing the value, ignoring parentheses inside
    /// string literals
    fn value_end(&self) -> Option<usize> {
        let bytes = self.input.as_bytes();
        let mut in_string: Option<u8> = None;
        let mut i = self.pos;

        while i < bytes.len() {
            let b = bytes[i];
            match in_string {
                Some(_) if b == b'\\' => i += 1,
                Some(q) if b == q => in_string = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => in_string = Some(b),
                None if b == b')' => return Some(i),
                None => {}
            }
            i += 1;
        }
        None
    }
}
