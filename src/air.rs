use std::fmt;

use log::{debug, warn};
use miette::Result;

use crate::{
    error,
    span::Span,
    symbol::{Comp, Dest, Jump, SymbolTable, MAX_ADDRESS},
};

/// Assembly intermediate representation: real instructions, label declarations and the
/// symbol table they are resolved against.
#[derive(Debug)]
pub struct Air {
    /// Instructions in source order, one output word each
    ast: Vec<AirStmt>,
    /// Labels in source order
    labels: Vec<LabelDecl>,
    symbols: SymbolTable,
}

impl Default for Air {
    fn default() -> Self {
        Self::new()
    }
}

impl Air {
    pub fn new() -> Self {
        Air {
            ast: Vec::new(),
            labels: Vec::new(),
            symbols: SymbolTable::new(),
        }
    }

    pub fn add_stmt(&mut self, stmt: AirStmt) {
        self.ast.push(stmt)
    }

    pub fn add_label(&mut self, label: LabelDecl) {
        self.labels.push(label)
    }

    /// Program counter of the next instruction to be added.
    pub fn next_pc(&self) -> usize {
        self.ast.len()
    }

    /// Bind labels, then variables, in the symbol table. Labels go first so a variable
    /// can never take the place of a label declared further down.
    pub fn backpatch(&mut self) {
        for label in &self.labels {
            if self.symbols.contains(&label.name) {
                warn!(
                    "label `{}` declared more than once, keeping address {}",
                    label.name, label.pc
                );
            }
            debug!("label {} -> {}", label.name, label.pc);
            self.symbols.install_with_address(&label.name, label.pc);
        }

        for stmt in &self.ast {
            if let AirStmt::Address {
                operand: Operand::Symbol(name),
                ..
            } = stmt
            {
                if let Some(addr) = self.symbols.install_with_auto_address(name) {
                    debug!("variable {name} -> {addr}");
                }
            }
        }
    }

    /// Machine words for every instruction, in order. Expects `backpatch` to have run.
    pub fn emit(&self) -> Result<Vec<u16>> {
        self.ast.iter().map(|stmt| stmt.emit(&self.symbols)).collect()
    }

    pub fn get(&self, idx: usize) -> &AirStmt {
        &self.ast[idx]
    }

    pub fn len(&self) -> usize {
        self.ast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ast.is_empty()
    }

    pub fn labels(&self) -> &[LabelDecl] {
        &self.labels
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
}

impl<'a> IntoIterator for &'a Air {
    type Item = &'a AirStmt;
    type IntoIter = std::slice::Iter<'a, AirStmt>;

    fn into_iter(self) -> Self::IntoIter {
        self.ast.iter()
    }
}

/// Single Hack instruction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AirStmt {
    /// `@value`, load a constant or an address into A
    Address { operand: Operand, span: Span },
    /// `dest=comp;jump`
    Compute {
        dest: Option<Dest>,
        comp: Comp,
        jump: Option<Jump>,
    },
}

impl AirStmt {
    pub fn emit(&self, symbols: &SymbolTable) -> Result<u16> {
        match self {
            AirStmt::Address { operand, span } => {
                let addr = match operand {
                    Operand::Constant(val) => *val,
                    Operand::Symbol(name) => symbols
                        .resolve(name)
                        .map_err(|_| error::link_unresolved(*span, name))?,
                };
                if addr > MAX_ADDRESS {
                    return Err(error::link_address_range(*span, addr));
                }
                Ok(addr)
            }
            AirStmt::Compute { dest, comp, jump } => Ok(0b111 << 13
                | comp.bits() << 6
                | dest.map_or(0, Dest::bits) << 3
                | jump.map_or(0, Jump::bits)),
        }
    }
}

impl fmt::Display for AirStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AirStmt::Address { operand, .. } => write!(f, "@{operand}"),
            AirStmt::Compute { dest, comp, jump } => {
                if let Some(dest) = dest {
                    write!(f, "{}=", dest.mnemonic())?;
                }
                f.write_str(comp.mnemonic())?;
                if let Some(jump) = jump {
                    write!(f, ";{}", jump.mnemonic())?;
                }
                Ok(())
            }
        }
    }
}

/// Operand of an A-instruction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    /// Literal in `0..=24576`
    Constant(u16),
    /// Predefined symbol, label or variable, resolved after parsing
    Symbol(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(val) => write!(f, "{val}"),
            Operand::Symbol(name) => f.write_str(name),
        }
    }
}

/// `(NAME)`, binds a name to the program counter of the instruction after it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LabelDecl {
    pub name: String,
    pub pc: u16,
    pub span: Span,
}

/// Render a machine word the way it is written to `.hack` files.
pub fn to_bin_string(word: u16) -> String {
    format!("{word:016b}")
}
