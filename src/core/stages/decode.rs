use crate::core::pipeline::hazards;
use crate::core::{Engine, STALL_BRANCH, STALL_RAW};
use crate::isa::{Format, Opcode};

/// Decode: captures source operands from the register file per the
/// instruction's format and marks the destination busy for writing formats.
///
/// On a RAW hazard the instruction is held: the F→D READ side is fed back
/// into its own WRITE side and the RAW stall flag blocks further fetches.
/// Control instructions raise the BRANCH stall flag until Execute resolves
/// their target.
pub(crate) fn decode_stage(engine: &mut Engine) {
    let mut inst = engine.if_id.read.inst;
    let pc = engine.if_id.read.pc;

    if hazards::need_decode_stall(&inst, &engine.regs, &engine.id_ex, &engine.ex_mem) {
        engine.stall_flags |= STALL_RAW;
        engine.if_id.hold();
        log::trace!("ID  pc={} raw stall", pc - 1);
        return;
    } else if engine.stall_flags & STALL_RAW != 0 {
        engine.stall_flags &= !STALL_RAW;
    }

    if inst.is_control() {
        engine.stall_flags |= STALL_BRANCH;
    }

    engine.cycle_record.stage_pcs[1] = (pc - 1) as u32;
    log::trace!("ID  pc={} op={:?}", pc - 1, inst.op);

    match inst.fmt {
        Format::R => {
            inst.s1 = engine.regs.read(inst.rs1 as usize);
            inst.s2 = engine.regs.read(inst.rs2 as usize);
            engine.regs.set_busy(inst.rd as usize);
        }
        Format::I => {
            // Loads keep the immediate in rs1 and the base register in rs2.
            if inst.op == Opcode::Lw {
                inst.imm = inst.rs1;
                inst.s1 = engine.regs.read(inst.rs2 as usize);
            } else {
                inst.s1 = engine.regs.read(inst.rs1 as usize);
                inst.imm = inst.rs2;
            }
            engine.regs.set_busy(inst.rd as usize);
        }
        // sw rd, imm(rs2): mem[RF[rs2] + imm] <- RF[rd]
        Format::S => {
            inst.s1 = engine.regs.read(inst.rd as usize);
            inst.imm = inst.rs1;
            inst.s2 = engine.regs.read(inst.rs2 as usize);
        }
        Format::B => {
            inst.s1 = engine.regs.read(inst.rd as usize);
            inst.s2 = engine.regs.read(inst.rs1 as usize);
            inst.imm = inst.rs2;
        }
        Format::U | Format::J => {
            inst.imm = inst.rs1;
            engine.regs.set_busy(inst.rd as usize);
        }
    }

    engine.id_ex.publish(inst, pc);
}
