//! Double-buffered pipeline latches.
//!
//! Each of the four inter-stage latches carries one instruction, the PC it
//! was fetched with, and a validity flag, on two sides: READ is the input to
//! the current cycle's stage, WRITE collects that stage's output and becomes
//! next cycle's READ when the pipeline shifts.

use crate::isa::Instruction;

/// One side of a latch.
#[derive(Clone, Copy, Debug, Default)]
pub struct LatchSlot {
    /// PC value as published by Fetch: one past the instruction's index.
    pub pc: i32,
    pub inst: Instruction,
    pub valid: bool,
}

/// A double-buffered latch between two adjacent stages.
#[derive(Clone, Copy, Debug, Default)]
pub struct Latch {
    pub read: LatchSlot,
    pub write: LatchSlot,
}

impl Latch {
    /// Publishes a stage's output to the WRITE side.
    pub fn publish(&mut self, inst: Instruction, pc: i32) {
        self.write = LatchSlot {
            pc,
            inst,
            valid: true,
        };
    }

    /// Feeds READ back into WRITE so the instruction survives the shift.
    /// This is how a stalled stage holds its instruction for another cycle.
    pub fn hold(&mut self) {
        self.write = self.read;
        self.write.valid = true;
    }

    /// End-of-cycle shift: WRITE becomes READ and WRITE is invalidated.
    /// An empty WRITE side drains the latch.
    pub fn shift(&mut self) {
        self.read = self.write;
        self.write.valid = false;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
