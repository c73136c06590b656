//! Statement splitter.
//!
//! Scans SQL text character by character and cuts it at every `;` that is
//! not inside a string literal, quoted identifier, dollar-quoted body or
//! comment. Block comments nest and dollar-quoted bodies only close on a
//! tag identical to the one that opened them.

/// Lexer state. Each variant describes what the scanner is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State<'a> {
    Raw,
    SingleQuote,
    EscapeString,
    DoubleQuote,
    DollarQuote(&'a str),
    LineComment,
    BlockComment { depth: usize },
}

struct Lexer<'a> {
    src: &'a str,
    start: usize,
    pos: usize,
    statements: Vec<&'a str>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            start: 0,
            pos: 0,
            statements: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume the next char if it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn close_statement(&mut self) {
        let statement = self.src[self.start..self.pos].trim();
        if !statement.is_empty() {
            self.statements.push(statement);
        }
        self.start = self.pos;
    }

    fn run(mut self) -> Vec<&'a str> {
        let mut state = State::Raw;
        loop {
            let Some(c) = self.bump() else {
                if self.pos > self.start {
                    self.close_statement();
                }
                break;
            };
            state = match state {
                State::Raw => self.raw(c),
                State::SingleQuote => self.quoted(c, '\'', State::SingleQuote),
                State::DoubleQuote => self.quoted(c, '"', State::DoubleQuote),
                State::EscapeString => {
                    if c == '\\' {
                        self.bump();
                        State::EscapeString
                    } else {
                        self.quoted(c, '\'', State::EscapeString)
                    }
                }
                State::DollarQuote(tag) => self.dollar_quoted(c, tag),
                State::LineComment => match c {
                    '\n' | '\r' => State::Raw,
                    _ => State::LineComment,
                },
                State::BlockComment { depth } => self.block_comment(c, depth),
            };
        }

        if self.statements.is_empty() {
            return vec![self.src];
        }
        self.statements
    }

    fn raw(&mut self, c: char) -> State<'a> {
        match c {
            'e' | 'E' if self.eat('\'') => State::EscapeString,
            '\'' => State::SingleQuote,
            '"' => State::DoubleQuote,
            '$' => match read_dollar_tag(&self.src[self.pos..]) {
                Some(tag) => {
                    self.pos += tag.len() + 1;
                    State::DollarQuote(tag)
                }
                None => State::Raw,
            },
            ';' => {
                self.close_statement();
                State::Raw
            }
            '-' if self.eat('-') => State::LineComment,
            '/' if self.eat('*') => State::BlockComment { depth: 0 },
            _ => State::Raw,
        }
    }

    /// Shared handling for `'...'`, `e'...'` and `"..."` where a doubled
    /// quote character is an escaped quote.
    fn quoted(&mut self, c: char, quote: char, current: State<'a>) -> State<'a> {
        if c != quote {
            return current;
        }
        if self.eat(quote) {
            current
        } else {
            State::Raw
        }
    }

    fn dollar_quoted(&mut self, c: char, open_tag: &'a str) -> State<'a> {
        if c == '$' {
            if let Some(tag) = read_dollar_tag(&self.src[self.pos..]) {
                if tag == open_tag {
                    self.pos += tag.len() + 1;
                    return State::Raw;
                }
            }
        }
        State::DollarQuote(open_tag)
    }

    fn block_comment(&mut self, c: char, depth: usize) -> State<'a> {
        match c {
            '/' if self.eat('*') => State::BlockComment { depth: depth + 1 },
            '*' if self.eat('/') => {
                if depth == 0 {
                    State::Raw
                } else {
                    State::BlockComment { depth: depth - 1 }
                }
            }
            _ => State::BlockComment { depth },
        }
    }
}

/// Read the tag of a dollar quote whose leading `$` has already been consumed.
///
/// Returns the tag without its `$` delimiters. `None` means the text is not a
/// dollar quote, e.g. a positional parameter such as `$1`.
fn read_dollar_tag(src: &str) -> Option<&str> {
    let mut chars = src.char_indices();
    match chars.next() {
        Some((_, '$')) => return Some(""),
        Some((_, c)) if c.is_alphabetic() || c == '_' => {}
        _ => return None,
    }
    for (idx, c) in chars {
        if c == '$' {
            return Some(&src[..idx]);
        }
        if !(c.is_alphabetic() || c == '_' || c.is_ascii_digit()) {
            return None;
        }
    }
    None
}

/// Split `sql` into individual statements.
///
/// Each returned statement is trimmed and keeps its trailing `;`. Statements
/// that are only whitespace are dropped. When no statement could be closed
/// the whole input is returned as the only element, so an empty input yields
/// a single empty statement.
pub fn split_statements(sql: &str) -> Vec<&str> {
    Lexer::new(sql).run()
}

#[cfg(test)]
#[path = "split_test.rs"]
mod tests;
