//! Heuristic call stack reconstruction for code running on an emulated CPU.
//!
//! The emulated program carries no frame pointers and no unwind tables, so we
//! guess: walk the instruction stream backwards until something looks like the
//! start of a function, then walk forwards again to see where the function put
//! its return address and how far it moved the stack pointer.
//!
//! The walk is bounded on every axis (see [`EngineConfig`]) and never fails;
//! it just stops, and [`CallStack::termination`] says why.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
extern crate tracing;

pub mod arch;
pub mod classify;
pub mod config;
pub mod identify;
pub mod memory;
pub mod view;
pub mod walk;

pub use classify::{Classify, Instruction};
pub use config::{ConfigError, EngineConfig};
pub use identify::{SymbolResolver, SymbolTable};
pub use memory::{MappedMemory, MemoryView};
pub use walk::boundary::{locate_function_start, BoundaryNotFound, FunctionStart, Heuristic};
pub use walk::{unwind, CallFrame, CallStack, RegisterSnapshot, Termination};

/// Every instruction word is this many bytes wide.
pub const INSTRUCTION_SIZE: u32 = 4;
