//! Configuration for the simulator.
//!
//! Loaded from TOML. Everything has a default, so an empty file (or no file
//! at all) yields a usable engine:
//!
//! ```toml
//! [engine]
//! mem_size = 400
//! stack_size = 200
//!
//! [latency]
//! mul = 3
//! div = 3
//! rem = 3
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::error::ConfigError;

pub const DEFAULT_MEM_SIZE: usize = 400;
pub const DEFAULT_STACK_SIZE: usize = 200;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-opcode Execute latency overrides, keyed by mnemonic.
    #[serde(default)]
    pub latency: HashMap<String, u32>,
}

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_mem_size")]
    pub mem_size: usize,

    #[serde(default = "default_stack_size")]
    pub stack_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mem_size: DEFAULT_MEM_SIZE,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

fn default_mem_size() -> usize {
    DEFAULT_MEM_SIZE
}

fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
