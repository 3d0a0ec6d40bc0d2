use crate::core::Engine;
use crate::isa::{Format, Opcode};

/// Memory: performs the word store or load for `sw`/`lw` at the effective
/// address computed in Execute. Branches retire here without reaching
/// Writeback; everything else passes through.
pub(crate) fn mem_stage(engine: &mut Engine) {
    let mut inst = engine.ex_mem.read.inst;
    let pc = engine.ex_mem.read.pc;

    engine.cycle_record.stage_pcs[3] = (pc - 1) as u32;

    if inst.fmt == Format::B {
        return;
    }

    match inst.op {
        Opcode::Sw => {
            if let Err(err) = engine.mem.store_word(inst.result, inst.s1) {
                engine.raise_fault(err);
                return;
            }
            log::trace!("MEM pc={} store [{}] <- {}", pc - 1, inst.result, inst.s1);
        }
        Opcode::Lw => match engine.mem.load_word(inst.result) {
            Ok(word) => {
                log::trace!("MEM pc={} load [{}] -> {}", pc - 1, inst.result, word);
                inst.result = word;
            }
            Err(err) => {
                engine.raise_fault(err);
                return;
            }
        },
        _ => {}
    }

    engine.mem_wb.publish(inst, pc);
}
