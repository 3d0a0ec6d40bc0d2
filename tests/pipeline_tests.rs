//! End-to-end pipeline tests: hazard scenarios, control flow, memory
//! semantics, diagnostics, and equivalence against a straightforward
//! non-pipelined reference interpreter.

use byteorder::{ByteOrder, LittleEndian};
use pretty_assertions::assert_eq;

use riscv_pipesim::asm::parse_program;
use riscv_pipesim::common::error::ExecError;
use riscv_pipesim::core::Engine;
use riscv_pipesim::isa::{Format, Instruction, Opcode};
use riscv_pipesim::stats::BypassSource;

const MEM: usize = 400;
const STACK: usize = 200;

fn load(engine: &mut Engine, src: &str) {
    let (program, entry) = parse_program(src).unwrap();
    engine.set_program(program, entry);
}

/// Runs a program to completion and checks the cross-cutting invariants.
fn run(src: &str) -> Engine {
    let mut engine = Engine::new(MEM, STACK).unwrap();
    load(&mut engine, src);
    engine.run_pipelined().unwrap();
    assert!(engine.is_halted());
    check_invariants(&engine);
    engine
}

fn check_invariants(engine: &Engine) {
    let diag = engine.diagnostics();
    // Pipeline fill: the first instruction needs all five stages.
    assert!(
        diag.cycles >= diag.executed_insts + 4,
        "cycles {} < executed {} + 4",
        diag.cycles,
        diag.executed_insts
    );
    // Stage records only ever hold real instruction indices.
    for record in &diag.cycle_records {
        for &stage_pc in &record.stage_pcs {
            assert!((stage_pc as usize) < diag.program_size);
        }
    }
    // x0 is architecturally zero, always.
    assert_eq!(engine.register(0), 0);
}

#[test]
fn engine_construction_validates_sizes() {
    assert!(Engine::new(400, 200).is_ok());
    assert!(Engine::new(0, 0).is_err());
    assert!(Engine::new(401, 200).is_err());
    assert!(Engine::new(400, 199).is_err());
    assert!(Engine::new(200, 400).is_err());
}

#[test]
fn stack_pointer_starts_at_memory_size() {
    let engine = Engine::new(MEM, STACK).unwrap();
    assert_eq!(engine.register(2), MEM as i32);
}

#[test]
fn raw_hazard_is_covered_by_forwarding() {
    let engine = run("addi t0, x0, 5\naddi t1, t0, 3\nend\n");
    assert_eq!(engine.register(5), 5);
    assert_eq!(engine.register(6), 8);

    let diag = engine.diagnostics();
    assert_eq!(diag.stalls, 0, "forwarding must avoid any stall");
    assert_eq!(diag.forwards, 1);
    assert_eq!(diag.cycles, 7);
    assert_eq!(diag.executed_insts, 3);

    // The dependent addi (index 2) receives its s1 from the X->M latch.
    let record = diag
        .cycle_records
        .iter()
        .find(|r| r.stage_pcs[2] == 2)
        .unwrap();
    assert_eq!(record.s1_bypass, BypassSource::ExMem);
    assert_eq!(record.s2_bypass, BypassSource::None);
}

#[test]
fn load_use_hazard_stalls_once_then_forwards_from_mem_wb() {
    let mut engine = Engine::new(MEM, STACK).unwrap();

    // First run plants a value; registers and memory survive reloads.
    load(&mut engine, "li t0, 7\nsw t0, 0(x0)\nend\n");
    engine.run_pipelined().unwrap();
    assert_eq!(engine.memory_word(0).unwrap(), 7);

    load(&mut engine, "lw t0, 0(x0)\nadd t1, t0, t0\nend\n");
    engine.run_pipelined().unwrap();
    assert_eq!(engine.register(6), 14);

    let diag = engine.diagnostics();
    // One stall while the load is in Execute; once it is in Memory the
    // loaded word forwards from the M->W latch.
    assert_eq!(diag.stalls, 1);
    assert_eq!(diag.cycles, 8);
    assert_eq!(diag.executed_insts, 3);

    let record = diag
        .cycle_records
        .iter()
        .find(|r| r.stage_pcs[2] == 2)
        .unwrap();
    assert_eq!(record.s1_bypass, BypassSource::MemWb);
    assert_eq!(record.s2_bypass, BypassSource::MemWb);
}

#[test]
fn multi_cycle_execute_holds_the_pipeline() {
    let engine = run("li t0, 6\nli t1, 7\nmul t2, t0, t1\nadd t3, t2, t2\nend\n");
    assert_eq!(engine.register(7), 42);
    assert_eq!(engine.register(28), 84);

    let diag = engine.diagnostics();
    // mul occupies Execute for three consecutive cycles.
    let mul_cycles = diag
        .cycle_records
        .iter()
        .filter(|r| r.stage_pcs[2] == 3)
        .count();
    assert_eq!(mul_cycles, 3);
    // The dependent add sits in Decode while mul churns.
    assert_eq!(diag.stalls, 2);
    assert_eq!(diag.cycles, 11);
    assert_eq!(diag.executed_insts, 5);
}

#[test]
fn taken_branch_skips_and_costs_one_bubble() {
    let engine = run("li t0, 1\nli t1, 1\nbeq t0, t1, 2\nli t2, 99\nli t2, 42\nend\n");
    assert_eq!(engine.register(7), 42, "the branch must skip the 99");

    let diag = engine.diagnostics();
    assert_eq!(diag.stalls, 1, "one control bubble per branch");
    assert_eq!(diag.cycles, 10);
    assert_eq!(diag.executed_insts, 5);

    // The branch compares forwarded operands: t0 from M->W, t1 from X->M.
    let record = diag
        .cycle_records
        .iter()
        .find(|r| r.stage_pcs[2] == 3)
        .unwrap();
    assert_eq!(record.s1_bypass, BypassSource::MemWb);
    assert_eq!(record.s2_bypass, BypassSource::ExMem);
}

#[test]
fn untaken_branch_falls_through() {
    let engine = run("li t0, 1\nli t1, 2\nbeq t0, t1, 2\nli t2, 99\nend\n");
    assert_eq!(engine.register(7), 99);
}

#[test]
fn branch_offset_is_relative_to_the_advanced_pc() {
    // beq x0, x0, 2 skips exactly one instruction.
    let engine = run("li t0, 5\nbeq x0, x0, 2\nli t1, 9\nli t2, 7\nend\n");
    assert_eq!(engine.register(5), 5);
    assert_eq!(engine.register(6), 0, "the skipped li must not execute");
    assert_eq!(engine.register(7), 7);
}

#[test]
fn call_and_return() {
    let engine = run("call f\nend\nf: li a0, 7\nret\n");
    assert_eq!(engine.register(10), 7);
    // ra points at the instruction after the call.
    assert_eq!(engine.register(1), 2);
}

#[test]
fn forward_label_fixup_round_trips_through_the_engine() {
    let engine = run("j end_lbl\nli t0, 1\nend_lbl: end\n");
    assert_eq!(engine.register(5), 0, "the jumped-over li must not run");
}

#[test]
fn stores_are_little_endian() {
    let engine = run("li t0, 67305985\nsw t0, 8(x0)\nend\n");
    assert_eq!(engine.memory_word(8).unwrap(), 0x0403_0201);
    assert_eq!(&engine.memory_bytes()[8..12], &[0x01, 0x02, 0x03, 0x04]);
}

#[test]
fn store_then_load_round_trips() {
    let engine = run("li t0, -123456\nsw t0, 396(x0)\nlw t1, 396(x0)\nend\n");
    assert_eq!(engine.register(6), -123456);
}

#[test]
fn stack_addressing_through_sp() {
    // sp starts at the memory size; push one word and read it back.
    let engine = run("addi sp, sp, -4\nli t0, 31\nsw t0, 0(sp)\nlw t1, 0(sp)\nend\n");
    assert_eq!(engine.register(2), (MEM - 4) as i32);
    assert_eq!(engine.register(6), 31);
    assert_eq!(engine.memory_word((MEM - 4) as i32).unwrap(), 31);
}

#[test]
fn unaligned_store_faults_and_halts() {
    let mut engine = Engine::new(MEM, STACK).unwrap();
    load(&mut engine, "li t0, 1\nsw t0, 2(x0)\nend\n");
    let err = engine.run_pipelined().unwrap_err();
    assert_eq!(err, ExecError::UnalignedAccess { addr: 2 });
    assert!(engine.is_halted());
    assert_eq!(engine.fault(), Some(&ExecError::UnalignedAccess { addr: 2 }));
}

#[test]
fn unaligned_load_faults_and_halts() {
    let mut engine = Engine::new(MEM, STACK).unwrap();
    load(&mut engine, "lw t0, 3(x0)\nend\n");
    let err = engine.run_pipelined().unwrap_err();
    assert_eq!(err, ExecError::UnalignedAccess { addr: 3 });
}

#[test]
fn out_of_range_store_faults_and_halts() {
    let mut engine = Engine::new(MEM, STACK).unwrap();
    load(&mut engine, "li t0, 1\nsw t0, 400(x0)\nend\n");
    let err = engine.run_pipelined().unwrap_err();
    assert_eq!(
        err,
        ExecError::OutOfBounds {
            addr: 400,
            size: MEM
        }
    );
}

#[test]
fn writes_to_x0_are_discarded() {
    let engine = run("addi x0, x0, 99\nadd t0, x0, x0\nend\n");
    assert_eq!(engine.register(0), 0);
    assert_eq!(engine.register(5), 0);
}

#[test]
fn busy_bits_drain_with_the_pipeline() {
    let engine = run("addi t0, x0, 5\naddi t1, t0, 3\nend\n");
    for reg in 1..32 {
        assert!(
            !engine.register_busy(reg),
            "x{reg} still marked busy after halt"
        );
    }
}

#[test]
fn program_without_end_drains_instead_of_spinning() {
    let mut engine = Engine::new(MEM, STACK).unwrap();
    engine.set_program(
        vec![
            Instruction::end(),
            Instruction::new(Opcode::Addi, 5, 0, 9),
        ],
        1,
    );
    engine.run_pipelined().unwrap();
    // No `end` ever reached Writeback, so the engine is not halted, but the
    // in-flight instruction completed.
    assert!(!engine.is_halted());
    assert_eq!(engine.register(5), 9);
}

#[test]
fn reloading_resets_diagnostics_but_keeps_state() {
    let mut engine = Engine::new(MEM, STACK).unwrap();
    load(&mut engine, "li s0, 11\nsw s0, 0(x0)\nend\n");
    engine.run_pipelined().unwrap();
    let first_cycles = engine.diagnostics().cycles;
    assert!(first_cycles > 0);

    load(&mut engine, "end\n");
    assert_eq!(engine.diagnostics().cycles, 0);
    assert!(engine.diagnostics().cycle_records.is_empty());
    // Architectural state survives the reload.
    assert_eq!(engine.register(8), 11);
    assert_eq!(engine.memory_word(0).unwrap(), 11);

    engine.run_pipelined().unwrap();
    assert!(engine.is_halted());
}

#[test]
fn cpi_is_cycles_over_instructions() {
    let engine = run("addi t0, x0, 5\naddi t1, t0, 3\nend\n");
    let diag = engine.diagnostics();
    assert!((diag.cpi() - 7.0 / 3.0).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Sequential equivalence
// ---------------------------------------------------------------------------

/// A plain fetch-through-writeback interpreter, one instruction at a time:
/// no latches, no stalls, no forwarding. For programs free of undefined
/// behavior the pipelined engine must produce the same architectural state.
fn reference_run(
    program: &[Instruction],
    entry: i32,
    mem_size: usize,
) -> ([i32; 32], Vec<u8>) {
    let mut regs = [0i32; 32];
    regs[2] = mem_size as i32;
    let mut mem = vec![0u8; mem_size];

    fn write(regs: &mut [i32; 32], rd: i32, val: i32) {
        if rd != 0 {
            regs[rd as usize] = val;
        }
    }

    let mut idx = entry;
    loop {
        let inst = program[idx as usize];
        if inst.op == Opcode::End {
            break;
        }

        let (s1, s2, imm) = match inst.format() {
            Format::R => (regs[inst.rs1 as usize], regs[inst.rs2 as usize], 0),
            Format::I if inst.op == Opcode::Lw => (regs[inst.rs2 as usize], 0, inst.rs1),
            Format::I => (regs[inst.rs1 as usize], 0, inst.rs2),
            Format::S => (regs[inst.rd as usize], regs[inst.rs2 as usize], inst.rs1),
            Format::B => (regs[inst.rd as usize], regs[inst.rs1 as usize], inst.rs2),
            Format::U | Format::J => (0, 0, inst.rs1),
        };

        let mut next = idx + 1;
        match inst.op {
            Opcode::Add => write(&mut regs, inst.rd, s1.wrapping_add(s2)),
            Opcode::Sub => write(&mut regs, inst.rd, s1.wrapping_sub(s2)),
            Opcode::Mul => write(&mut regs, inst.rd, s1.wrapping_mul(s2)),
            Opcode::Div => write(
                &mut regs,
                inst.rd,
                if s2 == 0 { -1 } else { s1.wrapping_div(s2) },
            ),
            Opcode::Rem => write(
                &mut regs,
                inst.rd,
                if s2 == 0 { s1 } else { s1.wrapping_rem(s2) },
            ),
            Opcode::Xor => write(&mut regs, inst.rd, s1 ^ s2),
            Opcode::Or => write(&mut regs, inst.rd, s1 | s2),
            Opcode::And => write(&mut regs, inst.rd, s1 & s2),
            Opcode::Addi => write(&mut regs, inst.rd, s1.wrapping_add(imm)),
            Opcode::Subi => write(&mut regs, inst.rd, s1.wrapping_sub(imm)),
            Opcode::Xori => write(&mut regs, inst.rd, s1 ^ imm),
            Opcode::Ori => write(&mut regs, inst.rd, s1 | imm),
            Opcode::Andi => write(&mut regs, inst.rd, s1 & imm),
            Opcode::Slli => write(
                &mut regs,
                inst.rd,
                (s1 as u32).wrapping_shl(imm as u32) as i32,
            ),
            Opcode::Lw => {
                let addr = s1.wrapping_add(imm) as usize;
                let word = LittleEndian::read_u32(&mem[addr..addr + 4]) as i32;
                write(&mut regs, inst.rd, word);
            }
            Opcode::Sw => {
                let addr = s2.wrapping_add(imm) as usize;
                LittleEndian::write_u32(&mut mem[addr..addr + 4], s1 as u32);
            }
            Opcode::Beq => {
                if s1 == s2 {
                    next = idx + imm;
                }
            }
            Opcode::Bne => {
                if s1 != s2 {
                    next = idx + imm;
                }
            }
            Opcode::Blt => {
                if s1 < s2 {
                    next = idx + imm;
                }
            }
            Opcode::Bge => {
                if s1 >= s2 {
                    next = idx + imm;
                }
            }
            Opcode::Jal => {
                write(&mut regs, inst.rd, idx + 1);
                next = idx + imm;
            }
            Opcode::Jalr => {
                write(&mut regs, inst.rd, idx + 1);
                next = s1.wrapping_add(imm);
            }
            Opcode::Lui => write(&mut regs, inst.rd, imm),
            Opcode::Auipc => write(&mut regs, inst.rd, idx.wrapping_add(imm)),
            _ => {}
        }
        idx = next;
    }

    (regs, mem)
}

#[test]
fn pipelined_run_matches_the_sequential_reference() {
    let src = "\
main:
    li a0, 10
    call sum
    sw a0, 0(x0)
    lw s1, 0(x0)
    div s2, s1, a0      ; exercises the multi-cycle unit
    rem s3, s1, a0
    end

; sum of 1..a0 by simple loop
sum:
    li t0, 0
    li t1, 1
sum_loop:
    add t0, t0, t1
    addi t1, t1, 1
    ble t1, a0, sum_loop
    mv a0, t0
    ret
";
    let (program, entry) = parse_program(src).unwrap();
    let (ref_regs, ref_mem) = reference_run(&program, entry, MEM);
    assert_eq!(ref_regs[10], 55, "reference interpreter sanity");

    let mut engine = Engine::new(MEM, STACK).unwrap();
    engine.set_program(program, entry);
    engine.run_pipelined().unwrap();

    assert_eq!(engine.registers(), ref_regs);
    assert_eq!(engine.memory_bytes(), &ref_mem[..]);
}
