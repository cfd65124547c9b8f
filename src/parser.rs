use log::{info, trace};
use miette::Result;

use crate::{
    air::{Air, AirStmt, LabelDecl, Operand},
    error,
    lexer::{tokenize, Token, TokenKind},
    symbol::{Comp, Dest, Jump, Register, SymbolTable, MAX_ADDRESS},
};

/// Largest constant accepted by an A-instruction, the keyboard register.
pub const MAX_CONSTANT: u32 = 24576;

/// Transforms token stream into AIR
pub struct AsmParser<'a> {
    /// Reference to the source file
    src: &'a str,
    /// Full token buffer, terminated by `Eof`
    toks: Vec<Token<'a>>,
    /// Assembly intermediate representation
    air: Air,
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str) -> Result<Self> {
        let toks = tokenize(src)?;
        trace!("lexed {} tokens", toks.len());
        Ok(AsmParser {
            src,
            toks,
            air: Air::new(),
        })
    }

    /// Token at `pos`. Positions past the end stay on the final `Eof`.
    fn tok(&self, pos: usize) -> &Token<'a> {
        &self.toks[pos.min(self.toks.len() - 1)]
    }

    /// Create AIR out of token stream
    pub fn parse(mut self) -> Result<Air> {
        let mut pos = 0;
        loop {
            let tok = *self.tok(pos);
            pos = match tok.kind {
                TokenKind::Eof => break,
                // Blank and comment-only lines
                TokenKind::Eol | TokenKind::Comment => {
                    pos += 1;
                    continue;
                }
                TokenKind::Punct('(') => {
                    let (label, next) = self.parse_label(pos)?;
                    self.air.add_label(label);
                    next
                }
                TokenKind::Punct('@') => {
                    let (stmt, next) = self.parse_a_instr(pos)?;
                    self.air.add_stmt(stmt);
                    next
                }
                _ => {
                    let (stmt, next) = self.parse_c_instr(pos)?;
                    self.air.add_stmt(stmt);
                    next
                }
            };
            pos = self.expect_end_of_line(pos)?;
        }
        info!(
            "parsed {} instructions and {} labels",
            self.air.len(),
            self.air.labels().len()
        );
        // Consume self to return AIR
        Ok(self.air)
    }

    /// Only a comment may follow an instruction on the same line.
    fn expect_end_of_line(&self, pos: usize) -> Result<usize> {
        let tok = self.tok(pos);
        if tok.ends_line() {
            Ok(pos)
        } else {
            Err(error::parse_unexpected(
                self.src,
                "end of line",
                tok,
                "only one instruction or label is allowed per line",
            ))
        }
    }

    /// `@` followed by a symbol or a constant
    fn parse_a_instr(&self, pos: usize) -> Result<(AirStmt, usize)> {
        let tok = self.tok(pos + 1);
        let operand = match tok.kind {
            TokenKind::Ident => Operand::Symbol(tok.text.to_owned()),
            TokenKind::Num => match tok.text.parse::<u32>() {
                Ok(val) if val <= MAX_CONSTANT => Operand::Constant(val as u16),
                _ => return Err(error::parse_constant_range(self.src, tok)),
            },
            _ => {
                return Err(error::parse_unexpected(
                    self.src,
                    "identifier or number after `@`",
                    tok,
                    "A-instructions take the form @VALUE or @SYMBOL",
                ))
            }
        };
        let stmt = AirStmt::Address {
            operand,
            span: tok.span,
        };
        Ok((stmt, pos + 2))
    }

    /// `(NAME)`, pointing at the instruction that follows
    fn parse_label(&self, pos: usize) -> Result<(LabelDecl, usize)> {
        let name = self.tok(pos + 1);
        if name.kind != TokenKind::Ident {
            return Err(error::parse_unexpected(
                self.src,
                "identifier after `(`",
                name,
                "labels take the form (NAME)",
            ));
        }
        if SymbolTable::is_predefined(name.text) {
            return Err(error::parse_predefined_label(self.src, name));
        }

        let close = self.tok(pos + 2);
        if !close.is_punct(')') {
            return Err(error::parse_unexpected(
                self.src,
                "`)` after label",
                close,
                "labels take the form (NAME)",
            ));
        }

        let next_pc = self.air.next_pc();
        let pc = match u16::try_from(next_pc) {
            Ok(pc) if pc <= MAX_ADDRESS => pc,
            _ => return Err(error::parse_label_range(self.src, name, next_pc)),
        };
        let label = LabelDecl {
            name: name.text.to_owned(),
            pc,
            span: name.span,
        };
        Ok((label, pos + 3))
    }

    /// `[dest=]comp[;jump]`
    fn parse_c_instr(&self, pos: usize) -> Result<(AirStmt, usize)> {
        let (dest, pos) = self.parse_dest(pos)?;
        let (comp, pos) = self.parse_comp(pos)?;
        let (jump, pos) = self.parse_jump(pos)?;
        Ok((AirStmt::Compute { dest, comp, jump }, pos))
    }

    fn parse_dest(&self, pos: usize) -> Result<(Option<Dest>, usize)> {
        let tok = self.tok(pos);
        if tok.kind != TokenKind::Ident || self.tok(pos + 1).kind != TokenKind::Equals {
            return Ok((None, pos));
        }
        match tok.text.parse::<Dest>() {
            Ok(dest) => Ok((Some(dest), pos + 2)),
            Err(_) => Err(error::parse_bad_dest(self.src, tok)),
        }
    }

    fn parse_comp(&self, mut pos: usize) -> Result<(Comp, usize)> {
        let first = *self.tok(pos);
        let mut left: Option<Token> = None;
        let mut op: Option<Token> = None;
        let mut right: Option<Token> = None;

        if is_operand(self.tok(pos)) {
            left = Some(*self.tok(pos));
            pos += 1;
        }
        if is_comp_operator(self.tok(pos)) {
            op = Some(*self.tok(pos));
            pos += 1;
            if is_operand(self.tok(pos)) {
                right = Some(*self.tok(pos));
                pos += 1;
            }
        } else if let (Some(lhs), true) = (left, is_operand(self.tok(pos))) {
            let span = lhs.span.join(self.tok(pos).span);
            return Err(error::parse_bad_comp(
                self.src,
                span,
                &lhs,
                "expected operator after first operand",
            ));
        }

        let last = *self.tok(pos.saturating_sub(1));
        let span = first.span.join(last.span);

        let (left, right) = match (left, op, right) {
            (None, _, None) => {
                return Err(error::parse_unexpected(
                    self.src,
                    "comp operand",
                    self.tok(pos),
                    "C-instructions need a computation such as D+1 or M",
                ))
            }
            (Some(_), Some(_), None) => {
                return Err(error::parse_unexpected(
                    self.src,
                    "operand after operator",
                    self.tok(pos),
                    "binary comps need a second operand, e.g. D+1",
                ))
            }
            (Some(lhs), _, Some(rhs)) => {
                if lhs.kind == TokenKind::Num && rhs.kind == TokenKind::Num {
                    return Err(error::parse_bad_comp(
                        self.src,
                        span,
                        &first,
                        "two constant operands",
                    ));
                }
                if lhs.kind == TokenKind::Ident && rhs.kind == TokenKind::Ident {
                    if lhs.text == rhs.text {
                        let reason = format!("same operand `{}` used twice", lhs.text);
                        return Err(error::parse_bad_comp(self.src, span, &first, &reason));
                    }
                    if matches!((lhs.text, rhs.text), ("A", "M") | ("M", "A")) {
                        return Err(error::parse_bad_comp(
                            self.src,
                            span,
                            &first,
                            "cannot use A and M together",
                        ));
                    }
                }
                (Some(lhs), rhs)
            }
            // A lone operand is the right-hand side
            (Some(lhs), None, None) => (None, lhs),
            (None, _, Some(rhs)) => (None, rhs),
        };

        for operand in left.iter().chain(Some(&right)) {
            if operand.kind == TokenKind::Ident && operand.text.parse::<Register>().is_err() {
                let reason = format!("`{}` is not a register", operand.text);
                return Err(error::parse_bad_comp(self.src, operand.span, operand, &reason));
            }
        }

        let mut raw = String::new();
        for tok in [left, op, Some(right)].into_iter().flatten() {
            raw.push_str(tok.text);
        }
        match Comp::lookup(&raw) {
            Some(comp) => Ok((comp, pos)),
            None => {
                let reason = format!("unsupported computation `{raw}`");
                Err(error::parse_bad_comp(self.src, span, &first, &reason))
            }
        }
    }

    fn parse_jump(&self, pos: usize) -> Result<(Option<Jump>, usize)> {
        if self.tok(pos).kind != TokenKind::Semicolon {
            return Ok((None, pos));
        }
        let tok = self.tok(pos + 1);
        if tok.kind != TokenKind::Ident {
            return Err(error::parse_unexpected(
                self.src,
                "jump mnemonic after `;`",
                tok,
                "jumps take the form comp;JMP",
            ));
        }
        match tok.text.parse::<Jump>() {
            Ok(jump) => Ok((Some(jump), pos + 2)),
            Err(_) => Err(error::parse_bad_jump(self.src, tok)),
        }
    }
}

fn is_operand(tok: &Token) -> bool {
    matches!(tok.kind, TokenKind::Ident | TokenKind::Num)
}

fn is_comp_operator(tok: &Token) -> bool {
    matches!(
        tok.kind,
        TokenKind::Op | TokenKind::Punct('!' | '&' | '|')
    )
}

#[cfg(test)]
mod tests {
    use crate::air::{Air, AirStmt, Operand};
    use crate::symbol::{Comp, Dest, Jump};

    use super::AsmParser;

    fn parse(src: &str) -> miette::Result<Air> {
        AsmParser::new(src)?.parse()
    }

    fn compute(dest: Option<Dest>, comp: &str, jump: Option<Jump>) -> AirStmt {
        AirStmt::Compute {
            dest,
            comp: Comp::lookup(comp).unwrap(),
            jump,
        }
    }

    fn operand(stmt: &AirStmt) -> &Operand {
        match stmt {
            AirStmt::Address { operand, .. } => operand,
            other => panic!("expected A-instruction, found {other:?}"),
        }
    }

    #[test]
    fn parse_a_constant() {
        let air = parse("@2").unwrap();
        assert_eq!(air.len(), 1);
        assert_eq!(operand(air.get(0)), &Operand::Constant(2));
    }

    #[test]
    fn parse_a_constant_range() {
        let air = parse("@24576").unwrap();
        assert_eq!(operand(air.get(0)), &Operand::Constant(24576));
        assert!(parse("@24577").is_err());
        assert!(parse("@99999999999999999999").is_err());
    }

    #[test]
    fn parse_a_symbol() {
        let air = parse("@sys.init").unwrap();
        assert_eq!(operand(air.get(0)), &Operand::Symbol("sys.init".into()));
    }

    #[test]
    fn parse_a_bad_operand() {
        assert!(parse("@").is_err());
        assert!(parse("@-1").is_err());
        assert!(parse("@(LOOP)").is_err());
    }

    #[test]
    fn parse_c_full() {
        let air = parse("AM=M-1;JNE").unwrap();
        assert_eq!(
            air.get(0),
            &compute(Some(Dest::Am), "M-1", Some(Jump::Jne))
        );
    }

    #[test]
    fn parse_c_without_dest() {
        let air = parse("0;JMP\nD;JGT").unwrap();
        assert_eq!(air.get(0), &compute(None, "0", Some(Jump::Jmp)));
        assert_eq!(air.get(1), &compute(None, "D", Some(Jump::Jgt)));
    }

    #[test]
    fn parse_c_normalizes_single_operand() {
        let air = parse("D=M\nM=-1\nD=D-1").unwrap();
        assert_eq!(air.get(0), &compute(Some(Dest::D), "M", None));
        assert_eq!(air.get(1), &compute(Some(Dest::M), "-1", None));
        assert_eq!(air.get(2), &compute(Some(Dest::D), "D-1", None));
        if let AirStmt::Compute { comp, .. } = air.get(0) {
            assert_eq!(comp.bits(), 0b1110000);
        }
        if let AirStmt::Compute { comp, .. } = air.get(2) {
            assert_eq!(comp.bits(), 0b0001110);
        }
    }

    #[test]
    fn parse_c_logic_operators() {
        let air = parse("M=!M\nD=D&A\nD=D|M").unwrap();
        assert_eq!(air.get(0), &compute(Some(Dest::M), "!M", None));
        assert_eq!(air.get(1), &compute(Some(Dest::D), "D&A", None));
        assert_eq!(air.get(2), &compute(Some(Dest::D), "D|M", None));
    }

    #[test]
    fn parse_c_rejections() {
        // Forbidden register pair
        assert!(parse("D=A+M").is_err());
        assert!(parse("D=M-A").is_err());
        // Duplicate operand
        assert!(parse("D=A+A").is_err());
        // Two constants
        assert!(parse("D=1+1").is_err());
        // Missing operand after operator
        assert!(parse("D=D+").is_err());
        // Missing operator between operands
        assert!(parse("D=D 1").is_err());
        // Empty comp
        assert!(parse("D=").is_err());
        assert!(parse("D=;JMP").is_err());
        // Not a register
        assert!(parse("D=X").is_err());
        // Well-formed but not in the comp table
        assert!(parse("D=1+D").is_err());
        assert!(parse("D=A&D").is_err());
    }

    #[test]
    fn parse_c_bad_dest_and_jump() {
        assert!(parse("DM=A").is_err());
        assert!(parse("X=A").is_err());
        assert!(parse("0;JXX").is_err());
        assert!(parse("0;").is_err());
        assert!(parse("0;7").is_err());
    }

    #[test]
    fn parse_labels() {
        let air = parse(
            r#"
            (START)
            @END
            0;JMP
            (END)
            @START
            // trailing label
            (LAST)
            "#,
        )
        .unwrap();
        assert_eq!(air.len(), 3);
        let labels: Vec<_> = air.labels().iter().map(|l| (l.name.as_str(), l.pc)).collect();
        assert_eq!(labels, vec![("START", 0), ("END", 2), ("LAST", 3)]);
    }

    #[test]
    fn parse_label_rejections() {
        assert!(parse("(SCREEN)").is_err());
        assert!(parse("(R0)").is_err());
        assert!(parse("(LOOP").is_err());
        assert!(parse("(12)").is_err());
        assert!(parse("(LOOP) @1").is_err());
    }

    #[test]
    fn parse_one_instruction_per_line() {
        assert!(parse("@1 @2").is_err());
        assert!(parse("D=M D=A").is_err());
        assert!(parse("D=D+A+1").is_err());
        let air = parse("@1 // one\nD=A// two").unwrap();
        assert_eq!(air.len(), 2);
    }

    #[test]
    fn parse_blank_lines_and_comments() {
        let air = parse("\n\n// header\n\t\n  @7  \r\n\n").unwrap();
        assert_eq!(air.len(), 1);
        assert!(air.labels().is_empty());
    }

    #[test]
    fn parse_lexical_error() {
        assert!(parse("@1 / nope").is_err());
    }

    #[test]
    fn error_mentions_location() {
        let err = parse("@1\nD=A+M").unwrap_err();
        assert!(err.to_string().contains("2:3"), "{err}");
        let err = parse("@1\n  0;JXX").unwrap_err();
        assert!(err.to_string().contains("2:5"), "{err}");
    }
}
