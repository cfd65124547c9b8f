// Parsing
mod parser;
pub use parser::AsmParser;
mod air;
pub use air::{to_bin_string, Air, AirStmt, LabelDecl, Operand};

// Symbols and encodings
mod symbol;
pub use symbol::{Comp, Dest, Jump, Register, SymbolTable, Unresolved};

mod error;
mod lexer;
mod span;
pub use span::{Span, SrcOffset};

pub mod output;

use miette::Result;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 8;

/// Parse a source file and resolve all of its symbols.
pub fn assemble(src: &str) -> Result<Air> {
    let parser = AsmParser::new(src)?;
    let mut air = parser.parse()?;
    air.backpatch();
    Ok(air)
}

/// Translate a source file into its binary listing, one 16 character line per instruction.
pub fn translate(src: &str) -> Result<Vec<String>> {
    let air = assemble(src)?;
    let words = air
        .emit()
        .map_err(|e| e.with_source_code(src.to_owned()))?;
    Ok(words.into_iter().map(to_bin_string).collect())
}
