//! Pipeline stage implementations.
//!
//! Each stage is a free function over the engine, invoked by the cycle
//! driver in reverse order (Writeback first) so that every stage still sees
//! the previous cycle's latch contents on its READ side.

mod decode;
mod execute;
mod fetch;
mod memory_access;
mod write_back;

pub(crate) use decode::decode_stage;
pub(crate) use execute::execute_stage;
pub(crate) use fetch::fetch_stage;
pub(crate) use memory_access::mem_stage;
pub(crate) use write_back::wb_stage;
