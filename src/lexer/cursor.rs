// Heavily inspired and referenced from `rustc_lexer` and adapted to suit the project.
// See https://doc.rust-lang.org/beta/nightly-rustc/src/rustc_lexer/cursor.rs.html

use std::str::Chars;

/// Peekable iterator over a char sequence that keeps track of where it is in the source.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    /// Full source the cursor was created over
    src: &'a str,
    /// Iterator over the remaining chars
    chars: Chars<'a>,
    /// 1-based line of the next char
    row: u32,
    /// 1-based column of the next char
    col: u32,
}

pub(crate) const EOF_CHAR: char = '\0';

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Cursor<'a> {
        Cursor {
            src: input,
            chars: input.chars(),
            row: 1,
            col: 1,
        }
    }

    /// Peek the next char without consuming it. Returns `EOF_CHAR` at the end of input.
    pub fn first(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    /// Source is exhausted
    pub fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    /// Byte offset of the next char from the start of the source
    pub fn offset(&self) -> usize {
        self.src.len() - self.chars.as_str().len()
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    /// Slice of the source between `start` and the current offset
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.src[start..self.offset()]
    }

    /// Move to the next char, updating the row and column.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Consume chars while the predicate holds or until the input runs out.
    pub fn take_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while !self.is_eof() && predicate(self.first()) {
            self.bump();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Cursor;

    #[test]
    fn tracks_rows_and_cols() {
        let mut cur = Cursor::new("ab\ncd");
        assert_eq!((cur.row(), cur.col()), (1, 1));
        cur.bump();
        cur.bump();
        assert_eq!((cur.row(), cur.col()), (1, 3));
        cur.bump();
        assert_eq!((cur.row(), cur.col()), (2, 1));
        cur.take_while(|c| c != 'x');
        assert!(cur.is_eof());
        assert_eq!(cur.offset(), 5);
        assert_eq!(cur.slice_from(3), "cd");
    }
}
