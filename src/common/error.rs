//! Error types surfaced by the simulator.
//!
//! Three kinds: `ConfigError` (engine construction), `AsmError` (program
//! loading), and `ExecError` (runtime faults that halt the engine).

use thiserror::Error;

/// Invalid engine or latency configuration. The engine is not constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("memory size {0} must be a positive multiple of 4 bytes")]
    InvalidMemSize(usize),

    #[error("stack size {0} must be a positive multiple of 4 bytes")]
    InvalidStackSize(usize),

    #[error("stack size {stack} cannot exceed memory size {mem}")]
    StackLargerThanMemory { stack: usize, mem: usize },

    #[error("unknown opcode '{0}' in latency table")]
    UnknownLatencyOpcode(String),

    #[error("execute latency for '{0}' must be at least 1 cycle")]
    ZeroLatency(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A program could not be assembled. No program is installed and engine
/// state is unchanged.
#[derive(Debug, Error)]
pub enum AsmError {
    #[error("line {line}: unknown opcode '{mnemonic}'")]
    UnknownOpcode { line: usize, mnemonic: String },

    #[error("line {line}: unexpected operand '{token}'")]
    TooManyOperands { line: usize, token: String },

    #[error("undeclared label '{0}'")]
    UndeclaredLabel(String),

    #[error("label '{0}' used where no branch or jump target is expected")]
    IllegalLabelUse(String),

    #[error("failed to read program: {0}")]
    Io(#[from] std::io::Error),
}

/// A runtime fault. The engine logs it, records it, and halts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("unaligned word access at address {addr}; addresses must be 4-byte aligned")]
    UnalignedAccess { addr: i32 },

    #[error("address {addr} is outside the {size}-byte memory")]
    OutOfBounds { addr: i32, size: usize },
}
