//! Lexer for mica source text.
//!
//! The lexer walks the source one character at a time and produces a flat
//! token sequence. It keeps a small amount of state: the cursor, the
//! current line/column, the pending word buffer, and the comment state
//! machine.
//!
//! Each step proceeds in a fixed order:
//!
//! 1. consult the comment state (`//` to end of line, `/*` to `*/`),
//! 2. try the longest operator/punctuator match at the cursor,
//! 3. handle `"` string and `'` character literals with escape expansion,
//! 4. whitespace flushes the pending word,
//! 5. anything else accumulates into the pending word.
//!
//! A flushed word is matched as keyword → boolean → integer → float →
//! identifier. A `.` that immediately follows a pending integer word is
//! appended to the word instead of becoming a dot token, which is how
//! float literals like `1.5` form (and why `0..9` still lexes as two
//! integers around a `..`).
//!
//! Every error carries the exact line, column and span length of the
//! offending text and aborts the compilation.

use mica_base::{CompileError, FilePos, Interner, Result};

use crate::token::{Token, TokenKind, SYMBOLS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentState {
    None,
    SingleLine,
    MultiLine,
}

/// Character-cursor lexer producing a flat [`Token`] sequence.
pub struct Lexer<'i> {
    chars: Vec<char>,
    cursor: usize,
    line: u32,
    column: u32,
    word: String,
    word_pos: FilePos,
    comment: CommentState,
    interner: &'i mut Interner,
    tokens: Vec<Token>,
}

impl<'i> Lexer<'i> {
    pub fn new(source: &str, interner: &'i mut Interner) -> Self {
        Lexer {
            chars: source.chars().collect(),
            cursor: 0,
            line: 1,
            column: 1,
            word: String::new(),
            word_pos: FilePos::new(1, 1),
            comment: CommentState::None,
            interner,
            tokens: Vec::new(),
        }
    }

    /// Runs the lexer to end of input and returns the token sequence,
    /// terminated by a single [`TokenKind::Eof`].
    pub fn lex(mut self) -> Result<Vec<Token>> {
        while self.peek() != '\0' {
            if self.handle_comments()? {
                continue;
            }

            if let Some((kind, len)) = self.match_symbol() {
                // Floats: a dot straight after an integer word joins the
                // word instead of becoming a token.
                if kind == TokenKind::Dot && is_integer(&self.word) {
                    self.eat();
                    self.word.push('.');
                    continue;
                }

                let pos = FilePos::with_length(self.line, self.column, len as u32);
                self.flush()?;
                for _ in 0..len {
                    self.eat();
                }
                self.tokens.push(Token::new(kind, pos));
                continue;
            }

            let start = self.pos();
            let c = self.eat();

            if c == '"' {
                self.flush()?;
                let token = self.eat_string_literal(start)?;
                self.tokens.push(token);
                continue;
            }
            if c == '\'' {
                self.flush()?;
                let token = self.eat_char_literal(start)?;
                self.tokens.push(token);
                continue;
            }
            if c.is_whitespace() {
                self.flush()?;
                continue;
            }

            // No captures, keep constructing the current word.
            if self.word.is_empty() {
                self.word_pos = start;
            }
            self.word.push(c);
        }

        self.flush()?;
        self.tokens.push(Token::eof(self.pos()));
        Ok(self.tokens)
    }

    fn pos(&self) -> FilePos {
        FilePos::new(self.line, self.column)
    }

    fn peek(&self) -> char {
        self.peek_by(0)
    }

    fn peek_by(&self, offset: usize) -> char {
        self.chars.get(self.cursor + offset).copied().unwrap_or('\0')
    }

    /// Consumes one character, updating line and column counters.
    fn eat(&mut self) -> char {
        let Some(&c) = self.chars.get(self.cursor) else {
            return '\0';
        };
        self.cursor += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    /// Returns `true` when the current character belongs to a comment and
    /// has been consumed.
    fn handle_comments(&mut self) -> Result<bool> {
        match self.comment {
            CommentState::None => {
                if self.peek() == '/' {
                    match self.peek_by(1) {
                        '/' => {
                            self.flush()?;
                            self.comment = CommentState::SingleLine;
                        }
                        '*' => {
                            self.flush()?;
                            self.comment = CommentState::MultiLine;
                        }
                        _ => return Ok(false),
                    }
                    self.eat();
                    self.eat();
                    return Ok(true);
                }
                Ok(false)
            }
            CommentState::SingleLine => {
                if self.eat() == '\n' {
                    self.comment = CommentState::None;
                }
                Ok(true)
            }
            CommentState::MultiLine => {
                // Already inside the comment, eating twice is fine.
                if self.eat() == '*' && self.eat() == '/' {
                    self.comment = CommentState::None;
                }
                Ok(true)
            }
        }
    }

    /// Greedy longest-match over the operator table. Does not consume.
    fn match_symbol(&self) -> Option<(TokenKind, usize)> {
        let mut best: Option<(TokenKind, usize)> = None;
        for (spelling, kind) in SYMBOLS {
            let len = spelling.chars().count();
            if let Some((_, best_len)) = best {
                if len <= best_len {
                    continue;
                }
            }
            let matches = spelling
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek_by(i) == c);
            if matches {
                best = Some((*kind, len));
            }
        }
        best
    }

    fn eat_escaped(&mut self) -> Result<char> {
        let pos = self.pos();
        let next = self.eat();
        let c = match next {
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'b' => '\u{0008}',
            't' => '\t',
            'r' => '\r',
            'n' => '\n',
            '0' => '\0',
            _ => {
                return Err(CompileError::lex(
                    "invalid string escape",
                    FilePos::with_length(pos.line, pos.column.saturating_sub(1), 2),
                ));
            }
        };
        Ok(c)
    }

    fn eat_string_literal(&mut self, start: FilePos) -> Result<Token> {
        let mut value = String::new();
        loop {
            match self.eat() {
                '"' => break,
                '\n' | '\0' => {
                    return Err(CompileError::lex(
                        "string literal not closed",
                        FilePos::with_length(start.line, start.column, value.chars().count().max(1) as u32),
                    ));
                }
                '\\' => {
                    let escaped = self.eat_escaped()?;
                    value.push(escaped);
                }
                c => value.push(c),
            }
        }

        let length = value.chars().count() as u32 + 2;
        let sym = self.interner.intern(&value);
        Ok(Token::new(
            TokenKind::Str(sym),
            FilePos::with_length(start.line, start.column, length),
        ))
    }

    fn eat_char_literal(&mut self, start: FilePos) -> Result<Token> {
        let mut c = self.eat();
        if c == '\n' || c == '\0' {
            return Err(CompileError::lex(
                "character literal not closed",
                FilePos::with_length(start.line, start.column, 1),
            ));
        }
        if c == '\\' {
            c = self.eat_escaped()?;
        }
        if self.eat() != '\'' {
            return Err(CompileError::lex(
                "expected ' to close a character literal",
                FilePos::with_length(start.line, start.column, 2),
            ));
        }
        Ok(Token::new(
            TokenKind::Char(c),
            FilePos::with_length(start.line, start.column, 3),
        ))
    }

    /// Turns the pending word into a token: keyword → boolean → integer →
    /// float → identifier.
    fn flush(&mut self) -> Result<()> {
        if self.word.is_empty() {
            return Ok(());
        }

        let pos = FilePos::with_length(
            self.word_pos.line,
            self.word_pos.column,
            self.word.chars().count() as u32,
        );

        let kind = if let Some(keyword) = TokenKind::keyword(&self.word) {
            keyword
        } else if self.word == "true" {
            TokenKind::Bool(true)
        } else if self.word == "false" {
            TokenKind::Bool(false)
        } else if is_integer(&self.word) {
            let value = self.word.parse::<i64>().map_err(|_| {
                CompileError::lex("integer literal out of range", pos)
            })?;
            TokenKind::Int(value)
        } else if is_float(&self.word) {
            let value = self.word.parse::<f64>().map_err(|_| {
                CompileError::lex("invalid float literal", pos)
            })?;
            TokenKind::Float(value)
        } else {
            // Identifiers may only contain alphanumerics and '_'; report
            // the exact offending column otherwise.
            for (i, c) in self.word.chars().enumerate() {
                if !issym(c) {
                    return Err(CompileError::lex(
                        "invalid character in identifier",
                        FilePos::with_length(pos.line, pos.column + i as u32, 1),
                    ));
                }
            }
            TokenKind::Ident(self.interner.intern(&self.word))
        };

        self.tokens.push(Token::new(kind, pos));
        self.word.clear();
        Ok(())
    }
}

/// Decimal integer, optionally with a leading `-`.
fn is_integer(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Decimal float with exactly one `.`, optionally with a leading `-`.
fn is_float(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    let mut had_dot = false;
    let mut had_digit = false;
    for c in digits.chars() {
        if c.is_ascii_digit() {
            had_digit = true;
        } else if c == '.' && !had_dot {
            had_dot = true;
        } else {
            return false;
        }
    }
    had_dot && had_digit
}

/// Valid identifier character: alphanumeric or `_`.
fn issym(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
