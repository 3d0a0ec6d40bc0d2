//! The instruction record that flows through the pipeline.

use super::{Format, Opcode};

/// A single decoded instruction.
///
/// `op`, `rd`, `rs1`, and `rs2` are the static fields filled by the
/// assembler. Register fields double as immediate storage depending on the
/// format (for example an I-format immediate lives in `rs2`), which is why
/// they are plain `i32`s; −1 marks a label operand whose fixup is pending.
///
/// The remaining fields are working state mutated while this instruction
/// travels the pipeline: operands captured at Decode, the ALU or address
/// result, and the count of Execute cycles still owed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Instruction {
    pub op: Opcode,
    pub rd: i32,
    pub rs1: i32,
    pub rs2: i32,

    pub s1: i32,
    pub s2: i32,
    pub imm: i32,
    pub result: i32,
    pub fmt: Format,
    pub ex_remaining: u32,
}

impl Instruction {
    /// Constructs an instruction and classifies its format from the opcode.
    pub fn new(op: Opcode, rd: i32, rs1: i32, rs2: i32) -> Self {
        Self {
            op,
            rd,
            rs1,
            rs2,
            fmt: op.format(),
            ..Default::default()
        }
    }

    /// The synthetic terminator placed at program index 0.
    pub fn end() -> Self {
        Self::new(Opcode::End, 0, 0, 0)
    }

    pub fn format(&self) -> Format {
        self.fmt
    }

    /// Whether this instruction writes its destination register at
    /// Writeback. Stores and branches never do.
    pub fn writes_rd(&self) -> bool {
        matches!(self.fmt, Format::R | Format::I | Format::U | Format::J)
    }

    /// Control instructions resolve their target in Execute and block
    /// fetching until then.
    pub fn is_control(&self) -> bool {
        matches!(self.fmt, Format::B | Format::J) || self.op == Opcode::Jalr
    }

    /// The registers this instruction reads at Decode, per format. `None`
    /// marks an unused slot.
    ///
    /// Differs from [`alu_input_regs`](Self::alu_input_regs) only for
    /// stores, whose first source (the value to store) is read at Decode but
    /// never enters the ALU.
    pub fn source_regs(&self) -> (Option<i32>, Option<i32>) {
        match self.fmt {
            Format::R => (Some(self.rs1), Some(self.rs2)),
            // For loads the immediate sits in rs1 and the base in rs2.
            Format::I if self.op == Opcode::Lw => (Some(self.rs2), None),
            Format::I => (Some(self.rs1), None),
            Format::S => (Some(self.rd), Some(self.rs2)),
            Format::B => (Some(self.rd), Some(self.rs1)),
            Format::U | Format::J => (None, None),
        }
    }

    /// The registers feeding the ALU inputs `(s1, s2)` at Execute.
    pub fn alu_input_regs(&self) -> (Option<i32>, Option<i32>) {
        match self.fmt {
            Format::R => (Some(self.rs1), Some(self.rs2)),
            Format::I if self.op == Opcode::Lw => (Some(self.rs2), None),
            Format::I => (Some(self.rs1), None),
            Format::S => (None, Some(self.rs2)),
            Format::B => (Some(self.rd), Some(self.rs1)),
            Format::U | Format::J => (None, None),
        }
    }
}
