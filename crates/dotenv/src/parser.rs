//! Single-pass state-machine parser for the dotenv grammar.
//!
//! Responsibilities:
//! - Transform a UTF-8 buffer into an ordered list of (key, raw-value)
//!   pairs with escape sequences resolved and quotes stripped.
//! - Track line and column for precise parse errors.
//!
//! Does NOT handle:
//! - Variable expansion or JSON decoding (see `postprocess.rs`).
//! - File I/O or decryption (see `loader.rs`, `envelope.rs`).
//!
//! Invariants / Assumptions:
//! - One pass, O(n) in input length; no backtracking.
//! - Keys match `[A-Za-z_][A-Za-z0-9_]*`; bad keys are rejected where they
//!   start, not downstream.
//! - Duplicate keys are preserved in source order; precedence is decided by
//!   the post-processor.

use crate::error::{DotenvError, Result};

/// A single (key, raw-value) pair in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    /// The assignment key, matching `[A-Za-z_][A-Za-z0-9_]*`.
    pub key: String,
    /// The raw value with escapes resolved and quotes stripped. Expansion
    /// has not happened yet.
    pub value: String,
}

impl ParsedEntry {
    fn new(key: String, value: String) -> Self {
        Self { key, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    LineStart,
    Key,
    AfterKey,
    BeforeValue,
    ValueUnquoted,
    ValueSingle,
    ValueDouble,
    ValueBacktick,
    LineEnd,
    Comment,
}

/// Parse a dotenv buffer into an ordered list of entries.
pub fn parse(input: &str) -> Result<Vec<ParsedEntry>> {
    Parser::new(input).run()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    state: State,
    key: String,
    value: String,
    entries: Vec<ParsedEntry>,
}

fn is_key_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_key_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            state: State::LineStart,
            key: String::new(),
            value: String::new(),
            entries: Vec::new(),
        }
    }

    /// Consume the current character, updating the line/column counters.
    fn advance(&mut self) {
        if self.chars[self.pos] == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += 1;
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn error(&self, message: &'static str) -> DotenvError {
        DotenvError::Parse {
            line: self.line,
            column: self.column,
            message,
        }
    }

    fn store_entry(&mut self) {
        let key = std::mem::take(&mut self.key);
        let value = std::mem::take(&mut self.value);
        self.entries.push(ParsedEntry::new(key, value));
    }

    fn store_trimmed_entry(&mut self) {
        let trimmed = self.value.trim_end_matches([' ', '\t']).len();
        self.value.truncate(trimmed);
        self.store_entry();
    }

    fn run(mut self) -> Result<Vec<ParsedEntry>> {
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            match self.state {
                State::LineStart => match c {
                    ' ' | '\t' | '\r' | '\n' => {}
                    '#' => self.state = State::Comment,
                    c if is_key_start(c) => {
                        self.key.push(c);
                        self.state = State::Key;
                    }
                    _ => return Err(self.error("Invalid character at start of line")),
                },
                State::Key => match c {
                    c if is_key_continue(c) => self.key.push(c),
                    '=' => self.state = State::BeforeValue,
                    ' ' | '\t' => self.state = State::AfterKey,
                    '\n' | '\r' => {
                        self.store_entry();
                        self.state = State::LineStart;
                    }
                    _ => return Err(self.error("Invalid character in key name")),
                },
                State::AfterKey => match c {
                    ' ' | '\t' => {}
                    '=' => self.state = State::BeforeValue,
                    _ => return Err(self.error("Expected '=' after key")),
                },
                State::BeforeValue => match c {
                    ' ' | '\t' => {}
                    '"' => self.state = State::ValueDouble,
                    '\'' => self.state = State::ValueSingle,
                    '`' => self.state = State::ValueBacktick,
                    '\n' | '\r' => {
                        self.store_entry();
                        self.state = State::LineStart;
                    }
                    '#' => {
                        self.store_entry();
                        self.state = State::Comment;
                    }
                    _ => {
                        self.value.push(c);
                        self.state = State::ValueUnquoted;
                    }
                },
                State::ValueUnquoted => match c {
                    '\n' | '\r' => {
                        self.store_trimmed_entry();
                        self.state = State::LineStart;
                    }
                    '#' if self.value.ends_with([' ', '\t']) => {
                        self.store_trimmed_entry();
                        self.state = State::Comment;
                    }
                    _ => self.value.push(c),
                },
                State::ValueSingle => match c {
                    '\\' if self.peek() == Some('\'') => {
                        self.value.push('\'');
                        self.advance();
                    }
                    '\'' => {
                        self.store_entry();
                        self.state = State::LineEnd;
                    }
                    _ => self.value.push(c),
                },
                State::ValueDouble | State::ValueBacktick => {
                    let closing = if self.state == State::ValueDouble {
                        '"'
                    } else {
                        '`'
                    };
                    match c {
                        '\\' => {
                            if let Some(escaped) = self.peek() {
                                self.value.push(match escaped {
                                    'n' => '\n',
                                    'r' => '\r',
                                    't' => '\t',
                                    other => other,
                                });
                                self.advance();
                            }
                        }
                        c if c == closing => {
                            self.store_entry();
                            self.state = State::LineEnd;
                        }
                        _ => self.value.push(c),
                    }
                }
                State::LineEnd => match c {
                    ' ' | '\t' | '\r' => {}
                    '\n' => self.state = State::LineStart,
                    '#' => self.state = State::Comment,
                    _ => return Err(self.error("Unexpected character after quoted value")),
                },
                State::Comment => {
                    if c == '\n' {
                        self.state = State::LineStart;
                    }
                }
            }
            self.advance();
        }
        self.finish()
    }

    /// End-of-input finalization: pending unquoted work is stored, open
    /// quotes are rejected.
    fn finish(mut self) -> Result<Vec<ParsedEntry>> {
        match self.state {
            State::Key | State::AfterKey | State::BeforeValue => self.store_entry(),
            State::ValueUnquoted => self.store_trimmed_entry(),
            State::ValueSingle | State::ValueDouble | State::ValueBacktick => {
                return Err(self.error("Unterminated quoted string at end of file"));
            }
            State::LineStart | State::LineEnd | State::Comment => {}
        }
        Ok(self.entries)
    }
}
