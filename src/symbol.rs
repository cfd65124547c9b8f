use std::{fmt, str::FromStr};

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

// Symbol table of symbol -> memory address
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// First address handed out to variables.
pub const VARIABLE_BASE: u16 = 16;

/// Largest value an A-instruction can carry.
pub const MAX_ADDRESS: u16 = 0x7FFF;

/// Names bound before any resolution happens. Several names alias the same address.
pub const PREDEFINED: [(&str, u16); 23] = [
    ("SP", 0),
    ("LCL", 1),
    ("ARG", 2),
    ("THIS", 3),
    ("THAT", 4),
    ("R0", 0),
    ("R1", 1),
    ("R2", 2),
    ("R3", 3),
    ("R4", 4),
    ("R5", 5),
    ("R6", 6),
    ("R7", 7),
    ("R8", 8),
    ("R9", 9),
    ("R10", 10),
    ("R11", 11),
    ("R12", 12),
    ("R13", 13),
    ("R14", 14),
    ("R15", 15),
    ("SCREEN", 16384),
    ("KBD", 24576),
];

/// Lookup of a name that was never given an address.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Unresolved(pub String);

impl std::error::Error for Unresolved {}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "symbol not found: {}", self.0)
    }
}

/// Maps names to addresses for a single assembly run.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    /// `None` marks a reserved name that has no address yet
    table: FxMap<String, Option<u16>>,
    /// Next address given to a variable
    free: u16,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Table holding only the predefined symbols.
    pub fn new() -> Self {
        let mut table = FxMap::with_capacity_and_hasher(PREDEFINED.len(), FxBuildHasher::default());
        for (name, addr) in PREDEFINED {
            table.insert(name.to_owned(), Some(addr));
        }
        SymbolTable {
            table,
            free: VARIABLE_BASE,
        }
    }

    pub fn is_predefined(name: &str) -> bool {
        PREDEFINED.iter().any(|(pre, _)| *pre == name)
    }

    /// Reserve a name without an address. Does nothing if the name is known.
    pub fn install(&mut self, name: &str) {
        if !self.table.contains_key(name) {
            self.table.insert(name.to_owned(), None);
        }
    }

    /// Bind a name to an explicit address, replacing any previous binding.
    pub fn install_with_address(&mut self, name: &str, addr: u16) {
        self.table.insert(name.to_owned(), Some(addr));
    }

    /// Bind a name to the next free address unless it is already known.
    /// Returns the freshly assigned address, if any.
    pub fn install_with_auto_address(&mut self, name: &str) -> Option<u16> {
        if self.table.contains_key(name) {
            return None;
        }
        let addr = self.free;
        self.free = self.free.saturating_add(1);
        self.table.insert(name.to_owned(), Some(addr));
        Some(addr)
    }

    pub fn resolve(&self, name: &str) -> Result<u16, Unresolved> {
        match self.table.get(name) {
            Some(Some(addr)) => Ok(*addr),
            _ => Err(Unresolved(name.to_owned())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Entries in insertion order: predefined first, then labels, then variables.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<u16>)> {
        self.table.iter().map(|(name, addr)| (name.as_str(), *addr))
    }
}

/// Registers that can appear as comp operands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Register {
    A,
    D,
    /// Memory at the address held in A
    M,
}

impl FromStr for Register {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Register::A),
            "D" => Ok(Register::D),
            "M" => Ok(Register::M),
            _ => Err(()),
        }
    }
}

/// Registers receiving the result of a C-instruction. Absence is encoded as `000`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dest {
    M = 0b001,
    D = 0b010,
    Md = 0b011,
    A = 0b100,
    Am = 0b101,
    Ad = 0b110,
    Amd = 0b111,
}

impl Dest {
    pub fn bits(self) -> u16 {
        self as u16
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Dest::M => "M",
            Dest::D => "D",
            Dest::Md => "MD",
            Dest::A => "A",
            Dest::Am => "AM",
            Dest::Ad => "AD",
            Dest::Amd => "AMD",
        }
    }
}

impl FromStr for Dest {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Dest::M),
            "D" => Ok(Dest::D),
            "MD" => Ok(Dest::Md),
            "A" => Ok(Dest::A),
            "AM" => Ok(Dest::Am),
            "AD" => Ok(Dest::Ad),
            "AMD" => Ok(Dest::Amd),
            _ => Err(()),
        }
    }
}

/// Jump condition tested against the comp result. Absence is encoded as `000`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Jump {
    /// > 0
    Jgt = 0b001,
    /// = 0
    Jeq = 0b010,
    /// >= 0
    Jge = 0b011,
    /// < 0
    Jlt = 0b100,
    /// != 0
    Jne = 0b101,
    /// <= 0
    Jle = 0b110,
    /// Unconditional
    Jmp = 0b111,
}

impl Jump {
    pub fn bits(self) -> u16 {
        self as u16
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Jump::Jgt => "JGT",
            Jump::Jeq => "JEQ",
            Jump::Jge => "JGE",
            Jump::Jlt => "JLT",
            Jump::Jne => "JNE",
            Jump::Jle => "JLE",
            Jump::Jmp => "JMP",
        }
    }
}

impl FromStr for Jump {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JGT" => Ok(Jump::Jgt),
            "JEQ" => Ok(Jump::Jeq),
            "JGE" => Ok(Jump::Jge),
            "JLT" => Ok(Jump::Jlt),
            "JNE" => Ok(Jump::Jne),
            "JLE" => Ok(Jump::Jle),
            "JMP" => Ok(Jump::Jmp),
            _ => Err(()),
        }
    }
}

/// Every computation the ALU supports, keyed by its textual form. The leading bit is
/// the `a` bit selecting M over A.
const COMP_TABLE: [(&str, u16); 28] = [
    ("0", 0b0101010),
    ("1", 0b0111111),
    ("-1", 0b0111010),
    ("D", 0b0001100),
    ("A", 0b0110000),
    ("!D", 0b0001101),
    ("!A", 0b0110001),
    ("-D", 0b0001111),
    ("-A", 0b0110011),
    ("D+1", 0b0011111),
    ("A+1", 0b0110111),
    ("D-1", 0b0001110),
    ("A-1", 0b0110010),
    ("D+A", 0b0000010),
    ("D-A", 0b0010011),
    ("A-D", 0b0000111),
    ("D&A", 0b0000000),
    ("D|A", 0b0010101),
    ("M", 0b1110000),
    ("!M", 0b1110001),
    ("-M", 0b1110011),
    ("M+1", 0b1110111),
    ("M-1", 0b1110010),
    ("D+M", 0b1000010),
    ("D-M", 0b1010011),
    ("M-D", 0b1000111),
    ("D&M", 0b1000000),
    ("D|M", 0b1010101),
];

/// Validated computation of a C-instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Comp {
    mnemonic: &'static str,
    bits: u16,
}

impl Comp {
    /// Look up the textual form of a comp, e.g. `D+1`.
    pub fn lookup(raw: &str) -> Option<Comp> {
        COMP_TABLE
            .iter()
            .find(|(mnemonic, _)| *mnemonic == raw)
            .map(|&(mnemonic, bits)| Comp { mnemonic, bits })
    }

    /// 7-bit code including the `a` bit.
    pub fn bits(self) -> u16 {
        self.bits
    }

    pub fn mnemonic(self) -> &'static str {
        self.mnemonic
    }
}

#[cfg(test)]
mod tests {
    use super::{Comp, Dest, Jump, SymbolTable, Unresolved};

    #[test]
    fn predefined_symbols() {
        let table = SymbolTable::new();
        assert_eq!(table.resolve("SP"), Ok(0));
        assert_eq!(table.resolve("R0"), Ok(0));
        assert_eq!(table.resolve("THAT"), Ok(4));
        assert_eq!(table.resolve("R15"), Ok(15));
        assert_eq!(table.resolve("SCREEN"), Ok(16384));
        assert_eq!(table.resolve("KBD"), Ok(24576));
        assert_eq!(table.len(), 23);
        assert!(SymbolTable::is_predefined("LCL"));
        assert!(!SymbolTable::is_predefined("LOOP"));
    }

    #[test]
    fn auto_address_is_sequential() {
        let mut table = SymbolTable::new();
        assert_eq!(table.install_with_auto_address("i"), Some(16));
        assert_eq!(table.install_with_auto_address("sum"), Some(17));
        // Already known names keep their address and do not consume one
        assert_eq!(table.install_with_auto_address("i"), None);
        assert_eq!(table.install_with_auto_address("R3"), None);
        assert_eq!(table.install_with_auto_address("n"), Some(18));
        assert_eq!(table.resolve("sum"), Ok(17));
        assert_eq!(table.resolve("R3"), Ok(3));
    }

    #[test]
    fn labels_overwrite_and_block_auto_address() {
        let mut table = SymbolTable::new();
        table.install_with_address("LOOP", 4);
        table.install_with_address("LOOP", 9);
        assert_eq!(table.install_with_auto_address("LOOP"), None);
        assert_eq!(table.resolve("LOOP"), Ok(9));
    }

    #[test]
    fn reserved_name_is_unresolved() {
        let mut table = SymbolTable::new();
        table.install("later");
        table.install("later");
        assert!(table.contains("later"));
        assert_eq!(table.resolve("later"), Err(Unresolved("later".into())));
        // A reserved name is present, so it never receives a variable address
        assert_eq!(table.install_with_auto_address("later"), None);
        table.install_with_address("later", 2);
        assert_eq!(table.resolve("later"), Ok(2));
        // Reserving a bound name keeps the binding
        table.install("KBD");
        assert_eq!(table.resolve("KBD"), Ok(24576));
    }

    #[test]
    fn unknown_symbol_error() {
        let table = SymbolTable::new();
        let err = table.resolve("nope").unwrap_err();
        assert_eq!(err.to_string(), "symbol not found: nope");
    }

    #[test]
    fn iteration_keeps_insertion_order() {
        let mut table = SymbolTable::new();
        table.install_with_address("END", 10);
        table.install_with_auto_address("x");
        let tail: Vec<_> = table.iter().skip(23).collect();
        assert_eq!(tail, vec![("END", Some(10)), ("x", Some(16))]);
    }

    #[test]
    fn mnemonics() {
        assert_eq!("AMD".parse::<Dest>(), Ok(Dest::Amd));
        assert_eq!(Dest::Md.bits(), 0b011);
        assert!("DM".parse::<Dest>().is_err());
        assert_eq!("JLE".parse::<Jump>(), Ok(Jump::Jle));
        assert_eq!(Jump::Jmp.bits(), 0b111);
        assert!("JXX".parse::<Jump>().is_err());
    }

    #[test]
    fn comp_table() {
        assert_eq!(Comp::lookup("M").map(Comp::bits), Some(0b1110000));
        assert_eq!(Comp::lookup("D-1").map(Comp::bits), Some(0b0001110));
        assert_eq!(Comp::lookup("D|M").map(Comp::bits), Some(0b1010101));
        assert_eq!(Comp::lookup("0").map(Comp::mnemonic), Some("0"));
        assert!(Comp::lookup("A+M").is_none());
        assert!(Comp::lookup("1+D").is_none());
    }
}
