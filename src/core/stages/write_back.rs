use crate::core::Engine;
use crate::isa::Opcode;

/// Writeback: halts on the `end` terminator; otherwise clears the
/// destination's busy bit for writing formats and stores the result.
/// Writes to x0 are discarded by the register file, but its busy bit is
/// still released so the scoreboard stays consistent.
pub(crate) fn wb_stage(engine: &mut Engine) {
    let inst = engine.mem_wb.read.inst;
    let pc = engine.mem_wb.read.pc;

    engine.cycle_record.stage_pcs[4] = (pc - 1) as u32;

    if inst.op == Opcode::End {
        log::trace!("WB  pc={} end, halting", pc - 1);
        engine.halted = true;
        return;
    }

    if inst.writes_rd() {
        engine.regs.clear_busy(inst.rd as usize);
        engine.regs.write(inst.rd as usize, inst.result);
        log::trace!("WB  pc={} x{} <- {}", pc - 1, inst.rd, inst.result);
    }
}
