//! Lexer for chirsh input lines.
//!
//! Converts a raw line into a [`Pipeline`] in a single pass. The grammar is
//! deliberately small: words, quotes, backslash escapes, `|` and `&`.
//!
//! # Rules
//!
//! - Whitespace separates words outside quotes.
//! - `'...'` suppresses every special meaning, backslash included.
//! - `"..."` suppresses `|`, `&` and whitespace splitting; backslash still
//!   escapes the next character.
//! - An unquoted backslash escapes the next character. A trailing backslash
//!   at end of line is kept as a literal backslash.
//! - An unquoted `|` ends the current stage.
//! - An unquoted `&` ends the current stage and marks the *whole* pipeline as
//!   background, wherever it appears in the line.
//!
//! Unterminated quotes are not an error: the rest of the line is read as if
//! still inside the quote. Tokenizing never fails.

use chirsh_types::Pipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Accumulates words into stages and stages into a pipeline.
#[derive(Default)]
struct Builder {
    stages: Vec<Vec<String>>,
    current: Vec<String>,
    word: String,
    background: bool,
}

impl Builder {
    fn end_word(&mut self) {
        if !self.word.is_empty() {
            self.current.push(std::mem::take(&mut self.word));
        }
    }

    fn end_stage(&mut self) {
        self.end_word();
        if !self.current.is_empty() {
            self.stages.push(std::mem::take(&mut self.current));
        }
    }

    fn finish(mut self) -> Pipeline {
        self.end_stage();
        Pipeline::new(self.stages, self.background)
    }
}

/// Tokenize a line into a pipeline.
pub fn tokenize(line: &str) -> Pipeline {
    let mut out = Builder::default();
    let mut quote = Quote::None;
    let mut escaped = false;

    for ch in line.chars() {
        if escaped {
            out.word.push(ch);
            escaped = false;
            continue;
        }

        match (quote, ch) {
            (Quote::Single, '\'') => quote = Quote::None,
            (Quote::Single, _) => out.word.push(ch),

            (_, '\\') => escaped = true,

            (Quote::Double, '"') => quote = Quote::None,
            (Quote::Double, _) => out.word.push(ch),

            (Quote::None, '\'') => quote = Quote::Single,
            (Quote::None, '"') => quote = Quote::Double,
            (Quote::None, '|') => out.end_stage(),
            (Quote::None, '&') => {
                out.end_stage();
                out.background = true;
            }
            (Quote::None, c) if c.is_whitespace() => out.end_word(),
            (Quote::None, _) => out.word.push(ch),
        }
    }

    if escaped {
        out.word.push('\\');
    }

    out.finish()
}
