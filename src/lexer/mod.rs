use std::fmt;

use miette::Result;

use crate::error;
use crate::lexer::cursor::Cursor;
use crate::span::{Span, SrcOffset};

pub mod cursor;

/// Single lexical unit of Hack assembly along with where it was found.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Literal text of the token as it appears in the source
    pub text: &'a str,
    pub span: Span,
    /// 1-based line number
    pub row: u32,
    /// 1-based column number
    pub col: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Ident,
    Num,
    Comment,
    /// `+` or `-`
    Op,
    Equals,
    Semicolon,
    Eol,
    Eof,
    /// Any other single character, e.g. `@`, `(` or `)`
    Punct(char),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident => f.write_str("identifier"),
            TokenKind::Num => f.write_str("number"),
            TokenKind::Comment => f.write_str("comment"),
            TokenKind::Op => f.write_str("operator"),
            TokenKind::Equals => f.write_str("`=`"),
            TokenKind::Semicolon => f.write_str("`;`"),
            TokenKind::Eol => f.write_str("end of line"),
            TokenKind::Eof => f.write_str("end of file"),
            TokenKind::Punct(c) => write!(f, "`{c}`"),
        }
    }
}

impl Token<'_> {
    /// True for tokens that may legally terminate an instruction line.
    pub fn ends_line(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Eol | TokenKind::Comment | TokenKind::Eof
        )
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }
}

/// Lex the whole source into a buffer. The result always ends with a single `Eof` token.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>> {
    let mut cursor = Cursor::new(src);
    let mut toks = Vec::new();
    loop {
        let tok = cursor.advance_token()?;
        toks.push(tok);
        if tok.kind == TokenKind::Eof {
            break;
        }
    }
    Ok(toks)
}

/// Test if a character is skipped between tokens. Line breaks are tokens of their own.
pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\x0B' | '\x0C')
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | ':' | '$' | '.')
}

pub(crate) fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '$' | '.')
}

impl<'a> Cursor<'a> {
    pub fn advance_token(&mut self) -> Result<Token<'a>> {
        self.take_while(is_whitespace);

        let start = self.offset();
        let (row, col) = (self.row(), self.col());
        let kind = match self.bump() {
            None => TokenKind::Eof,
            Some(c) => match c {
                '\n' => TokenKind::Eol,
                c if is_ident_start(c) => {
                    self.take_while(is_ident);
                    TokenKind::Ident
                }
                c if c.is_ascii_digit() => {
                    self.take_while(|c| c.is_ascii_digit());
                    TokenKind::Num
                }
                '/' => {
                    if self.first() != '/' {
                        let span = Span::new(SrcOffset(start), 1);
                        return Err(error::lex_bad_comment(span, row, col, self.src()));
                    }
                    self.take_while(|c| c != '\n');
                    TokenKind::Comment
                }
                '+' | '-' => TokenKind::Op,
                '=' => TokenKind::Equals,
                ';' => TokenKind::Semicolon,
                c => TokenKind::Punct(c),
            },
        };

        let text = self.slice_from(start);
        Ok(Token {
            kind,
            text,
            span: Span::new(SrcOffset(start), text.len()),
            row,
            col,
        })
    }
}
