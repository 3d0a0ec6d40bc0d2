use crate::core::pipeline::hazards;
use crate::core::{Engine, Memory, STALL_BRANCH};
use crate::isa::Opcode;

/// Execute: resolves operands against the bypass network, runs the ALU, and
/// applies control flow to the engine PC.
///
/// Operands are resolved on the cycle the instruction enters Execute, while
/// its producers are still visible in the X→M and M→W latches; a
/// multi-cycle instruction then carries the latched values through its
/// remaining cycles. While cycles remain it republishes itself to the D→X
/// WRITE side and produces nothing downstream.
pub(crate) fn execute_stage(engine: &mut Engine) {
    let mut inst = engine.id_ex.read.inst;
    let pc = engine.id_ex.read.pc;

    engine.cycle_record.stage_pcs[2] = (pc - 1) as u32;

    let entering = inst.ex_remaining == engine.latency_of(inst.op);
    inst.ex_remaining -= 1;

    if entering {
        let (rs1, rs2) = inst.alu_input_regs();
        if let Some((val, src)) =
            hazards::forward_operand(&engine.ex_mem.read, &engine.mem_wb.read, rs1)
        {
            inst.s1 = val;
            engine.cycle_record.s1_bypass = src;
            engine.diag.forwards += 1;
            log::trace!("EX  pc={} s1 bypass {:?} -> {}", pc - 1, src, val);
        }
        if let Some((val, src)) =
            hazards::forward_operand(&engine.ex_mem.read, &engine.mem_wb.read, rs2)
        {
            inst.s2 = val;
            engine.cycle_record.s2_bypass = src;
            engine.diag.forwards += 1;
            log::trace!("EX  pc={} s2 bypass {:?} -> {}", pc - 1, src, val);
        }
    }

    if inst.ex_remaining > 0 {
        engine.id_ex.publish(inst, pc);
        return;
    }

    let (s1, s2) = (inst.s1, inst.s2);
    match inst.op {
        Opcode::Add => inst.result = s1.wrapping_add(s2),
        Opcode::Sub => inst.result = s1.wrapping_sub(s2),
        Opcode::Mul => inst.result = s1.wrapping_mul(s2),
        // Zero divisors follow the RV32I convention: quotient -1,
        // remainder = dividend.
        Opcode::Div => {
            inst.result = if s2 == 0 { -1 } else { s1.wrapping_div(s2) };
        }
        Opcode::Rem => {
            inst.result = if s2 == 0 { s1 } else { s1.wrapping_rem(s2) };
        }
        Opcode::Xor => inst.result = s1 ^ s2,
        Opcode::Or => inst.result = s1 | s2,
        Opcode::And => inst.result = s1 & s2,

        Opcode::Addi => inst.result = s1.wrapping_add(inst.imm),
        Opcode::Subi => inst.result = s1.wrapping_sub(inst.imm),
        Opcode::Xori => inst.result = s1 ^ inst.imm,
        Opcode::Ori => inst.result = s1 | inst.imm,
        Opcode::Andi => inst.result = s1 & inst.imm,
        // Shift amount is taken modulo the register width.
        Opcode::Slli => inst.result = (s1 as u32).wrapping_shl(inst.imm as u32) as i32,

        Opcode::Lw => {
            let addr = s1.wrapping_add(inst.imm);
            if let Err(err) = Memory::check_aligned(addr) {
                engine.raise_fault(err);
            }
            inst.result = addr;
        }
        Opcode::Sw => {
            let addr = s2.wrapping_add(inst.imm);
            if let Err(err) = Memory::check_aligned(addr) {
                engine.raise_fault(err);
            }
            inst.result = addr;
        }

        // The engine PC was incremented at Fetch, hence the -1 on every
        // relative target.
        Opcode::Beq => {
            if s1 == s2 {
                engine.pc = engine.pc.wrapping_add(inst.imm.wrapping_sub(1));
            }
        }
        Opcode::Bne => {
            if s1 != s2 {
                engine.pc = engine.pc.wrapping_add(inst.imm.wrapping_sub(1));
            }
        }
        Opcode::Blt => {
            if s1 < s2 {
                engine.pc = engine.pc.wrapping_add(inst.imm.wrapping_sub(1));
            }
        }
        Opcode::Bge => {
            if s1 >= s2 {
                engine.pc = engine.pc.wrapping_add(inst.imm.wrapping_sub(1));
            }
        }

        Opcode::Jal => {
            inst.result = pc;
            engine.pc = engine.pc.wrapping_add(inst.imm.wrapping_sub(1));
        }
        Opcode::Jalr => {
            inst.result = pc;
            engine.pc = s1.wrapping_add(inst.imm);
        }

        Opcode::Lui => inst.result = inst.imm,
        Opcode::Auipc => inst.result = (pc - 1).wrapping_add(inst.imm),

        Opcode::Nop | Opcode::End => {}

        op => unreachable!("pseudo-instruction {op:?} reached Execute"),
    }

    // Target resolved; fetching may resume.
    if inst.is_control() {
        engine.stall_flags &= !STALL_BRANCH;
    }

    engine.ex_mem.publish(inst, pc);
}
