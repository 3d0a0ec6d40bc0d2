//! Simulation diagnostics: per-cycle records and summary counters.

use std::fmt::Write;

/// Where an Execute-stage ALU input came from in a given cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BypassSource {
    /// The value captured from the register file at Decode.
    #[default]
    None,
    /// Forwarded from the X→M latch.
    ExMem,
    /// Forwarded from the M→W latch.
    MemWb,
}

/// What happened in one cycle: which instruction index sat in each stage
/// (0 = empty), whether any stall flag was raised, and the bypass source
/// used for each ALU input.
#[derive(Clone, Copy, Debug, Default)]
pub struct CycleRecord {
    /// Instruction index per stage, ordered F, D, X, M, W.
    pub stage_pcs: [u32; 5],
    pub stalled: bool,
    pub s1_bypass: BypassSource,
    pub s2_bypass: BypassSource,
}

/// Accumulated counters and the ordered per-cycle trace.
///
/// Counters reset when a new program is installed; they are meaningful
/// once the engine has halted.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    pub program_size: usize,
    pub cycles: u64,
    /// Incremented each time Fetch successfully issues an instruction.
    pub executed_insts: u64,
    /// Cycles in which any stall flag was raised.
    pub stalls: u64,
    /// Execute-stage bypass injections, counted per operand.
    pub forwards: u64,
    pub cycle_records: Vec<CycleRecord>,
}

impl Diagnostics {
    pub(crate) fn reset(&mut self, program_size: usize) {
        *self = Self {
            program_size,
            ..Self::default()
        };
    }

    /// Cycles per instruction. Defined once the engine has halted; a zero
    /// instruction count is treated as one to keep the ratio finite.
    pub fn cpi(&self) -> f64 {
        let insts = if self.executed_insts == 0 {
            1
        } else {
            self.executed_insts
        };
        self.cycles as f64 / insts as f64
    }

    /// Plain-text summary of the run.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let w = &mut out;
        writeln!(w, "----------------------------------------").unwrap();
        writeln!(w, "PIPELINE SIMULATION STATISTICS").unwrap();
        writeln!(w, "----------------------------------------").unwrap();
        writeln!(w, "program_size      {}", self.program_size).unwrap();
        writeln!(w, "sim_cycles        {}", self.cycles).unwrap();
        writeln!(w, "sim_insts         {}", self.executed_insts).unwrap();
        writeln!(w, "sim_stalls        {}", self.stalls).unwrap();
        writeln!(w, "sim_forwards      {}", self.forwards).unwrap();
        writeln!(w, "sim_cpi           {:.4}", self.cpi()).unwrap();
        writeln!(w, "----------------------------------------").unwrap();
        out
    }
}
