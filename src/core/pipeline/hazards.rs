//! Data hazard detection and operand forwarding.
//!
//! Decode decides whether a RAW hazard can be covered by the Execute-time
//! bypass network; if not, the instruction holds in the F→D latch and the
//! RAW stall flag is raised. Execute resolves each ALU input against the
//! two bypass sources before computing.

use super::latches::{Latch, LatchSlot};
use crate::common::RegisterFile;
use crate::isa::{Instruction, Opcode};
use crate::stats::BypassSource;

/// Whether the instruction in `slot` produces a register-file write of
/// `reg` (stores and branches never do, and an empty slot produces
/// nothing).
fn writes_register(slot: &LatchSlot, reg: i32) -> bool {
    slot.valid && slot.inst.writes_rd() && slot.inst.rd == reg
}

/// Whether a busy source register read at Decode will be supplied by the
/// bypass network when this instruction reaches Execute next cycle.
///
/// Two producers qualify:
/// - the instruction completing Execute this cycle (D→X READ side): next
///   cycle it occupies the X→M READ slot. Loads are excluded; at that point
///   they carry only an effective address.
/// - the instruction in Memory this cycle (X→M READ side): next cycle it
///   occupies the M→W READ slot with its final value, loads included.
pub fn can_forward_later(id_ex_read: &LatchSlot, ex_mem_read: &LatchSlot, reg: i32) -> bool {
    if reg <= 0 {
        return true;
    }
    (writes_register(id_ex_read, reg) && id_ex_read.inst.op != Opcode::Lw)
        || writes_register(ex_mem_read, reg)
}

/// Decode-stage RAW stall decision.
///
/// Stalls when the D→X WRITE slot is still occupied (a multi-cycle Execute
/// has not drained), or when a busy source register cannot be covered by
/// the bypass. A store's first source is the value to be written; it never
/// enters the ALU, so it cannot be bypassed and must be settled.
pub fn need_decode_stall(
    inst: &Instruction,
    regs: &RegisterFile,
    id_ex: &Latch,
    ex_mem: &Latch,
) -> bool {
    if id_ex.write.valid {
        return true;
    }

    let (rs1, rs2) = inst.source_regs();

    if let Some(reg) = rs1 {
        if reg > 0 && regs.is_busy(reg as usize) {
            if inst.op == Opcode::Sw || !can_forward_later(&id_ex.read, &ex_mem.read, reg) {
                return true;
            }
        }
    }

    if let Some(reg) = rs2 {
        if reg > 0
            && regs.is_busy(reg as usize)
            && !can_forward_later(&id_ex.read, &ex_mem.read, reg)
        {
            return true;
        }
    }

    false
}

/// Resolves one ALU input against the bypass network.
///
/// Checks the X→M READ slot first (the younger producer), then the M→W READ
/// slot. A load in X→M holds only an effective address and cannot supply a
/// value; by M→W its loaded word is in `result` and forwards like any other
/// producer. Returns the injected value and the source used, or `None` when
/// the operand captured at Decode stands.
pub fn forward_operand(
    ex_mem_read: &LatchSlot,
    mem_wb_read: &LatchSlot,
    reg: Option<i32>,
) -> Option<(i32, BypassSource)> {
    let reg = reg?;
    if reg <= 0 {
        return None;
    }
    if writes_register(ex_mem_read, reg) && ex_mem_read.inst.op != Opcode::Lw {
        return Some((ex_mem_read.inst.result, BypassSource::ExMem));
    }
    if writes_register(mem_wb_read, reg) {
        return Some((mem_wb_read.inst.result, BypassSource::MemWb));
    }
    None
}
