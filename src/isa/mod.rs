//! Instruction Set Architecture definitions.
//!
//! A small RV32I-flavoured instruction set: register-register and immediate
//! arithmetic, word loads and stores, conditional branches, jumps, upper
//! immediates, a simulator-only `end` terminator, and a handful of
//! assembler-level pseudo-instructions that expand to the real operations
//! before the engine ever sees them.

pub mod abi;

mod instruction;

pub use instruction::Instruction;

/// Operation tag for a decoded instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Opcode {
    #[default]
    Nop,
    // Register-register
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Xor,
    Or,
    And,
    // Register-immediate
    Addi,
    Subi,
    Xori,
    Ori,
    Andi,
    Slli,
    Jalr,
    /// Load word
    Lw,
    /// Store word
    Sw,
    // Branches
    Beq,
    Bne,
    Blt,
    Bge,
    /// Jump and link
    Jal,
    // Upper immediates
    Lui,
    Auipc,
    // Pseudo-instructions, rewritten by the assembler
    Mv,
    Not,
    Neg,
    Li,
    Jr,
    Ret,
    Ble,
    Bgt,
    J,
    Call,
    /// Simulator-only terminator; halts the engine at Writeback.
    End,
}

/// Instruction format, mirroring the RISC-V encoding families.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    R,
    I,
    S,
    B,
    U,
    J,
}

impl Opcode {
    /// Resolves a source mnemonic. Pseudo-instructions are valid mnemonics;
    /// `Nop` is internal and has no spelling.
    pub fn from_mnemonic(s: &str) -> Option<Opcode> {
        let op = match s {
            "add" => Opcode::Add,
            "sub" => Opcode::Sub,
            "mul" => Opcode::Mul,
            "div" => Opcode::Div,
            "rem" => Opcode::Rem,
            "xor" => Opcode::Xor,
            "or" => Opcode::Or,
            "and" => Opcode::And,
            "addi" => Opcode::Addi,
            "subi" => Opcode::Subi,
            "xori" => Opcode::Xori,
            "ori" => Opcode::Ori,
            "andi" => Opcode::Andi,
            "slli" => Opcode::Slli,
            "jalr" => Opcode::Jalr,
            "lw" => Opcode::Lw,
            "sw" => Opcode::Sw,
            "beq" => Opcode::Beq,
            "bne" => Opcode::Bne,
            "blt" => Opcode::Blt,
            "bge" => Opcode::Bge,
            "jal" => Opcode::Jal,
            "lui" => Opcode::Lui,
            "auipc" => Opcode::Auipc,
            "mv" => Opcode::Mv,
            "not" => Opcode::Not,
            "neg" => Opcode::Neg,
            "li" => Opcode::Li,
            "jr" => Opcode::Jr,
            "ret" => Opcode::Ret,
            "ble" => Opcode::Ble,
            "bgt" => Opcode::Bgt,
            "j" => Opcode::J,
            "call" => Opcode::Call,
            "end" => Opcode::End,
            _ => return None,
        };
        Some(op)
    }

    /// Format classification. Pseudo-instructions must be expanded first;
    /// they classify as R only as a placeholder, as do `nop` and `end`
    /// (`end` is intercepted at Writeback before its format matters).
    pub fn format(self) -> Format {
        match self {
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Rem
            | Opcode::Xor
            | Opcode::Or
            | Opcode::And => Format::R,
            Opcode::Addi
            | Opcode::Subi
            | Opcode::Xori
            | Opcode::Ori
            | Opcode::Andi
            | Opcode::Slli
            | Opcode::Jalr
            | Opcode::Lw => Format::I,
            Opcode::Sw => Format::S,
            Opcode::Beq | Opcode::Bne | Opcode::Blt | Opcode::Bge => Format::B,
            Opcode::Jal => Format::J,
            Opcode::Lui | Opcode::Auipc => Format::U,
            _ => Format::R,
        }
    }

    pub fn is_pseudo(self) -> bool {
        matches!(
            self,
            Opcode::Mv
                | Opcode::Not
                | Opcode::Neg
                | Opcode::Li
                | Opcode::Jr
                | Opcode::Ret
                | Opcode::Ble
                | Opcode::Bgt
                | Opcode::J
                | Opcode::Call
        )
    }
}

/// Rewrites a pseudo-instruction into the real operation it stands for.
/// Non-pseudo instructions pass through unchanged.
///
/// Operands were bound positionally by the parser, so a single-operand
/// pseudo like `jr rs` carries its operand in `rd`.
pub fn expand_pseudo(ps: Instruction) -> Instruction {
    match ps.op {
        // addi rd, rs, 0
        Opcode::Mv => Instruction::new(Opcode::Addi, ps.rd, ps.rs1, 0),
        // xori rd, rs, -1
        Opcode::Not => Instruction::new(Opcode::Xori, ps.rd, ps.rs1, -1),
        // sub rd, x0, rs
        Opcode::Neg => Instruction::new(Opcode::Sub, ps.rd, 0, ps.rs1),
        // addi rd, x0, imm
        Opcode::Li => Instruction::new(Opcode::Addi, ps.rd, 0, ps.rs1),
        // jalr x0, rs, 0
        Opcode::Jr => Instruction::new(Opcode::Jalr, 0, ps.rd, 0),
        // jalr x0, ra, 0
        Opcode::Ret => Instruction::new(Opcode::Jalr, 0, abi::REG_RA, 0),
        // ble a, b, L  ->  bge b, a, L
        Opcode::Ble => Instruction::new(Opcode::Bge, ps.rs1, ps.rd, ps.rs2),
        // bgt a, b, L  ->  blt b, a, L
        Opcode::Bgt => Instruction::new(Opcode::Blt, ps.rs1, ps.rd, ps.rs2),
        // jal x0, L
        Opcode::J => Instruction::new(Opcode::Jal, 0, ps.rd, 0),
        // The RISC-V manual expands `call` to auipc+jalr for far targets.
        // Offsets here are line-relative and unbounded, so jal covers any
        // distance.
        Opcode::Call => Instruction::new(Opcode::Jal, abi::REG_RA, ps.rd, 0),
        _ => ps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_instruction_is_nop() {
        let inst = Instruction::default();
        assert_eq!(inst.op, Opcode::Nop);
        assert_eq!(inst.rd, 0);
        assert_eq!(inst.rs1, 0);
        assert_eq!(inst.rs2, 0);
    }

    #[test]
    fn pseudo_expansion_table() {
        let cases = [
            (
                Instruction::new(Opcode::Mv, 5, 6, 0),
                Instruction::new(Opcode::Addi, 5, 6, 0),
            ),
            (
                Instruction::new(Opcode::Not, 5, 6, 0),
                Instruction::new(Opcode::Xori, 5, 6, -1),
            ),
            (
                Instruction::new(Opcode::Neg, 5, 6, 0),
                Instruction::new(Opcode::Sub, 5, 0, 6),
            ),
            (
                Instruction::new(Opcode::Li, 5, 42, 0),
                Instruction::new(Opcode::Addi, 5, 0, 42),
            ),
            (
                Instruction::new(Opcode::Jr, 6, 0, 0),
                Instruction::new(Opcode::Jalr, 0, 6, 0),
            ),
            (
                Instruction::new(Opcode::Ret, 0, 0, 0),
                Instruction::new(Opcode::Jalr, 0, 1, 0),
            ),
            (
                Instruction::new(Opcode::Ble, 5, 6, 3),
                Instruction::new(Opcode::Bge, 6, 5, 3),
            ),
            (
                Instruction::new(Opcode::Bgt, 5, 6, 3),
                Instruction::new(Opcode::Blt, 6, 5, 3),
            ),
            (
                Instruction::new(Opcode::J, 4, 0, 0),
                Instruction::new(Opcode::Jal, 0, 4, 0),
            ),
            (
                Instruction::new(Opcode::Call, 4, 0, 0),
                Instruction::new(Opcode::Jal, 1, 4, 0),
            ),
        ];
        for (pseudo, expected) in cases {
            assert_eq!(expand_pseudo(pseudo), expected);
        }
    }

    #[test]
    fn format_classification() {
        assert_eq!(Opcode::Add.format(), Format::R);
        assert_eq!(Opcode::Addi.format(), Format::I);
        assert_eq!(Opcode::Lw.format(), Format::I);
        assert_eq!(Opcode::Sw.format(), Format::S);
        assert_eq!(Opcode::Beq.format(), Format::B);
        assert_eq!(Opcode::Jal.format(), Format::J);
        assert_eq!(Opcode::Lui.format(), Format::U);
        assert_eq!(Opcode::Auipc.format(), Format::U);
    }
}
