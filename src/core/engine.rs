use std::collections::HashMap;
use std::path::Path;

use crate::asm;
use crate::common::error::{AsmError, ConfigError, ExecError};
use crate::common::{RegisterFile, WORD_SIZE};
use crate::config::Config;
use crate::isa::{Instruction, Opcode};
use crate::stats::{CycleRecord, Diagnostics};

use super::memory::Memory;
use super::pipeline::latches::Latch;
use super::stages;

/// The five-stage pipelined execution engine.
///
/// Memory and registers are created once and survive program loads, so a
/// freshly installed program observes whatever state the previous run left
/// behind (useful for stepwise experiments). Counters, latches, and stall
/// state are reset per program.
pub struct Engine {
    pub(crate) pc: i32,
    pub(crate) program: Vec<Instruction>,

    pub(crate) regs: RegisterFile,
    pub(crate) mem: Memory,
    stack_size: usize,

    pub(crate) if_id: Latch,
    pub(crate) id_ex: Latch,
    pub(crate) ex_mem: Latch,
    pub(crate) mem_wb: Latch,

    pub(crate) halted: bool,
    pub(crate) stall_flags: u8,
    pub(crate) fault: Option<ExecError>,

    /// Execute-cycle counts per opcode; anything absent costs one cycle.
    latencies: HashMap<Opcode, u32>,

    pub(crate) diag: Diagnostics,
    /// Record under construction for the current cycle.
    pub(crate) cycle_record: CycleRecord,
}

fn default_latencies() -> HashMap<Opcode, u32> {
    HashMap::from([(Opcode::Mul, 3), (Opcode::Div, 3), (Opcode::Rem, 3)])
}

impl Engine {
    /// Creates an engine with `mem_size` bytes of memory, the stack pointer
    /// initialised to `mem_size` (the stack grows downward), and the
    /// default latency table.
    ///
    /// Both sizes must be positive multiples of the word size and the stack
    /// must fit in memory.
    pub fn new(mem_size: usize, stack_size: usize) -> Result<Self, ConfigError> {
        if mem_size == 0 || mem_size % WORD_SIZE != 0 {
            return Err(ConfigError::InvalidMemSize(mem_size));
        }
        if stack_size == 0 || stack_size % WORD_SIZE != 0 {
            return Err(ConfigError::InvalidStackSize(stack_size));
        }
        if stack_size > mem_size {
            return Err(ConfigError::StackLargerThanMemory {
                stack: stack_size,
                mem: mem_size,
            });
        }

        Ok(Self {
            pc: 0,
            program: Vec::new(),
            regs: RegisterFile::new(mem_size as i32),
            mem: Memory::new(mem_size),
            stack_size,
            if_id: Latch::default(),
            id_ex: Latch::default(),
            ex_mem: Latch::default(),
            mem_wb: Latch::default(),
            halted: false,
            stall_flags: 0,
            fault: None,
            latencies: default_latencies(),
            diag: Diagnostics::default(),
            cycle_record: CycleRecord::default(),
        })
    }

    /// Creates an engine from a [`Config`], applying its latency overrides
    /// on top of the defaults.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config.engine.mem_size, config.engine.stack_size)?;
        for (mnemonic, &cycles) in &config.latency {
            let op = Opcode::from_mnemonic(mnemonic)
                .ok_or_else(|| ConfigError::UnknownLatencyOpcode(mnemonic.clone()))?;
            if cycles == 0 {
                return Err(ConfigError::ZeroLatency(mnemonic.clone()));
            }
            engine.latencies.insert(op, cycles);
        }
        Ok(engine)
    }

    /// Parses the file at `path` and installs the program. On a parse error
    /// nothing is installed and engine state is unchanged.
    pub fn load_program<P: AsRef<Path>>(&mut self, path: P) -> Result<(), AsmError> {
        let (program, entry) = asm::parse_program_file(path)?;
        self.set_program(program, entry);
        Ok(())
    }

    /// Installs a program and resets per-run state: diagnostics, latches,
    /// stall flags, halt, fault, and the register busy bits. Register data
    /// and memory contents are deliberately left untouched.
    pub fn set_program(&mut self, program: Vec<Instruction>, entry_pc: i32) {
        self.pc = entry_pc;
        self.diag.reset(program.len());
        self.program = program;

        self.if_id.clear();
        self.id_ex.clear();
        self.ex_mem.clear();
        self.mem_wb.clear();

        self.halted = false;
        self.stall_flags = 0;
        self.fault = None;
        self.regs.clear_all_busy();
        self.cycle_record = CycleRecord::default();
    }

    pub(crate) fn latency_of(&self, op: Opcode) -> u32 {
        self.latencies.get(&op).copied().unwrap_or(1)
    }

    /// Records a runtime fault and halts the engine.
    pub(crate) fn raise_fault(&mut self, err: ExecError) {
        log::error!("{err}");
        if self.fault.is_none() {
            self.fault = Some(err);
        }
        self.halted = true;
    }

    fn can_fetch(&self) -> bool {
        self.pc >= 0
            && (self.pc as usize) < self.program.len()
            && !self.halted
            && self.stall_flags == 0
    }

    fn pipeline_empty(&self) -> bool {
        let slots = [
            &self.if_id, &self.id_ex, &self.ex_mem, &self.mem_wb,
        ];
        slots.iter().all(|l| !l.read.valid && !l.write.valid)
    }

    /// Advances the whole pipeline by one clock cycle.
    ///
    /// Stages run in reverse order (W, M, X, D, F) so each still sees the
    /// previous cycle's output on its latch READ side; the forwarding paths
    /// depend on that ordering. At the end of the cycle the record is
    /// committed and all four latches shift atomically.
    pub fn execute_cycle(&mut self) {
        self.diag.cycles += 1;
        self.cycle_record = CycleRecord::default();

        if self.mem_wb.read.valid && !self.halted {
            stages::wb_stage(self);
        }
        if self.ex_mem.read.valid && !self.halted {
            stages::mem_stage(self);
        }
        if self.id_ex.read.valid && !self.halted {
            stages::execute_stage(self);
        }
        if self.if_id.read.valid && !self.halted {
            stages::decode_stage(self);
        }
        if self.can_fetch() {
            stages::fetch_stage(self);
            self.diag.executed_insts += 1;
        }

        if self.stall_flags != 0 {
            self.diag.stalls += 1;
            self.cycle_record.stalled = true;
        }
        self.diag.cycle_records.push(self.cycle_record);

        self.if_id.shift();
        self.id_ex.shift();
        self.ex_mem.shift();
        self.mem_wb.shift();
    }

    /// Runs cycles until the engine halts (an `end` reaches Writeback or a
    /// fault occurs). A program that runs off its end without `end` drains
    /// and leaves the engine un-halted rather than spinning forever.
    pub fn run_pipelined(&mut self) -> Result<(), ExecError> {
        while !self.halted {
            self.execute_cycle();
            if !self.halted && self.pipeline_empty() && !self.can_fetch() {
                break;
            }
        }
        match &self.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    // Observers.

    pub fn pc(&self) -> i32 {
        self.pc
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The runtime fault that halted the engine, if any.
    pub fn fault(&self) -> Option<&ExecError> {
        self.fault.as_ref()
    }

    pub fn register(&self, idx: usize) -> i32 {
        self.regs.read(idx)
    }

    pub fn registers(&self) -> [i32; 32] {
        self.regs.snapshot()
    }

    pub fn register_busy(&self, idx: usize) -> bool {
        self.regs.is_busy(idx)
    }

    /// Reads an aligned word from memory without disturbing engine state.
    pub fn memory_word(&self, addr: i32) -> Result<i32, ExecError> {
        self.mem.load_word(addr)
    }

    pub fn memory_bytes(&self) -> &[u8] {
        self.mem.as_bytes()
    }

    pub fn memory_size(&self) -> usize {
        self.mem.len()
    }

    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }
}
