use miette::{miette, LabeledSpan, Report, Severity};

use crate::{lexer::Token, span::Span};

// Lexer errors

pub fn lex_bad_comment(span: Span, row: u32, col: u32, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "lex::comment",
        help = "comments start with `//` and run to the end of the line",
        labels = vec![LabeledSpan::at(span, "lone slash")],
        "Expected '//' for comment at {row}:{col}",
    )
    .with_source_code(src.to_owned())
}

// Parser errors

pub fn parse_unexpected(src: &str, expected: &str, found: &Token, help: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::unexpected_token",
        help = help.to_owned(),
        labels = vec![LabeledSpan::at(found.span, "unexpected token")],
        "Expected {expected}, found {} at {}:{}",
        found.kind,
        found.row,
        found.col,
    )
    .with_source_code(src.to_owned())
}

pub fn parse_constant_range(src: &str, tok: &Token) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::constant_range",
        help = "A-instruction constants range from 0 to 24576",
        labels = vec![LabeledSpan::at(tok.span, "out-of-range constant")],
        "Constant value {} out of range at {}:{}",
        tok.text,
        tok.row,
        tok.col,
    )
    .with_source_code(src.to_owned())
}

pub fn parse_bad_dest(src: &str, tok: &Token) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::dest",
        help = "legal destinations are M, D, MD, A, AM, AD and AMD",
        labels = vec![LabeledSpan::at(tok.span, "unknown destination")],
        "Invalid C-instruction dest `{}` at {}:{}",
        tok.text,
        tok.row,
        tok.col,
    )
    .with_source_code(src.to_owned())
}

pub fn parse_bad_jump(src: &str, tok: &Token) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::jump",
        help = "legal jumps are JGT, JEQ, JGE, JLT, JNE, JLE and JMP",
        labels = vec![LabeledSpan::at(tok.span, "unknown jump")],
        "Invalid C-instruction jump `{}` at {}:{}",
        tok.text,
        tok.row,
        tok.col,
    )
    .with_source_code(src.to_owned())
}

/// Comp was syntactically present but is not a computation the CPU supports.
pub fn parse_bad_comp(src: &str, span: Span, at: &Token, reason: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::comp",
        help = "comp combines at most two of 0, 1, A, D, M with one operator, and never A with M",
        labels = vec![LabeledSpan::at(span, "invalid comp")],
        "Invalid C-instruction comp at {}:{}: {reason}",
        at.row,
        at.col,
    )
    .with_source_code(src.to_owned())
}

pub fn parse_predefined_label(src: &str, tok: &Token) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::label",
        help = "registers, pointers, SCREEN and KBD are reserved names",
        labels = vec![LabeledSpan::at(tok.span, "reserved name")],
        "Label `{}` collides with a predefined symbol at {}:{}",
        tok.text,
        tok.row,
        tok.col,
    )
    .with_source_code(src.to_owned())
}

pub fn parse_label_range(src: &str, tok: &Token, pc: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::label",
        help = "programs can hold at most 32768 instructions",
        labels = vec![LabeledSpan::at(tok.span, "label past end of memory")],
        "Label `{}` would point at instruction {pc}, which is not addressable",
        tok.text,
    )
    .with_source_code(src.to_owned())
}

// Linker errors, source is attached by the caller

pub fn link_unresolved(span: Span, name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "link::unresolved",
        help = "every symbol must be predefined, a label, or a variable",
        labels = vec![LabeledSpan::at(span, "unresolved symbol")],
        "Symbol not found: {name}",
    )
}

pub fn link_address_range(span: Span, addr: u16) -> Report {
    miette!(
        severity = Severity::Error,
        code = "link::address_range",
        help = "A-instructions carry a 15-bit address",
        labels = vec![LabeledSpan::at(span, "address too large")],
        "Address {addr} does not fit in 15 bits",
    )
}
