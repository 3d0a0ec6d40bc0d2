use crate::core::Engine;

/// Fetch: reads the instruction at the current PC, charges it its execute
/// latency, and publishes it toward Decode. The PC in the F→D latch is the
/// already-incremented one; stages behind subtract one to recover the
/// instruction's own index.
pub(crate) fn fetch_stage(engine: &mut Engine) {
    let mut inst = engine.program[engine.pc as usize];
    inst.ex_remaining = engine.latency_of(inst.op);

    engine.cycle_record.stage_pcs[0] = engine.pc as u32;
    log::trace!("IF  pc={} op={:?}", engine.pc, inst.op);

    engine.pc += 1;
    engine.if_id.publish(inst, engine.pc);
}
