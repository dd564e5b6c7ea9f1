//! Finding where a function starts, without symbols.
//!
//! We look backwards from an address for either
//! - a return: whatever comes after it is most likely the next function, or
//! - a stack allocation: most likely the prologue of our function.
//!
//! The first one wins when both are in range, it is much less likely to lie.

use crate::{
    classify::{Classify, Instruction},
    config::EngineConfig,
    memory::MemoryView,
    INSTRUCTION_SIZE,
};

/// Which guess produced a [`FunctionStart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    /// The instruction after the previous function's return.
    AfterReturn,
    /// The nearest stack allocation.
    Prologue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionStart {
    pub address: u32,
    pub heuristic: Heuristic,
}

/// Nothing that looks like a function start was found within
/// [`EngineConfig::max_scan_distance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryNotFound;

/// Guesses the entry point of the function containing `address`.
///
/// The returned start is never above `address`. At most
/// `config.max_scan_distance()` words are read, and the scan stops early at
/// the first unmapped one.
#[instrument(level = "debug", skip_all, fields(address = %format_args!("{address:#010x}")))]
pub fn locate_function_start<M, C>(
    address: u32,
    memory: &M,
    classifier: &C,
    config: &EngineConfig,
) -> Result<FunctionStart, BoundaryNotFound>
where
    M: MemoryView + ?Sized,
    C: Classify + ?Sized,
{
    let return_len = classifier.return_width().saturating_mul(INSTRUCTION_SIZE);
    let mut prologue = None;

    for distance in 0..config.max_scan_distance() {
        let Some(at) = distance
            .checked_mul(INSTRUCTION_SIZE)
            .and_then(|back| address.checked_sub(back))
        else {
            trace!("ran into the bottom of the address space");
            break;
        };
        let Some(word) = memory.read32(at) else {
            trace!("{at:#010x} is unmapped, stopping scan");
            break;
        };

        match classifier.classify(word) {
            Instruction::Return => match at.checked_add(return_len) {
                // A return we are sitting in (or in the delay slot of) ends
                // our own function, not the one before it.
                Some(start) if start <= address => {
                    debug!("return at {at:#010x}, function starts at {start:#010x}");
                    return Ok(FunctionStart {
                        address: start,
                        heuristic: Heuristic::AfterReturn,
                    });
                }
                _ => trace!("ignoring return at {at:#010x}, it belongs to this function"),
            },
            Instruction::StackAdjust(Some(delta)) if delta < 0 && prologue.is_none() => {
                trace!("candidate prologue at {at:#010x} (sp {delta})");
                prologue = Some(at);
            }
            _ => {}
        }
    }

    match prologue {
        Some(address) => {
            debug!("no return in range, using prologue at {address:#010x}");
            Ok(FunctionStart {
                address,
                heuristic: Heuristic::Prologue,
            })
        }
        None => {
            debug!("no function boundary in range");
            Err(BoundaryNotFound)
        }
    }
}
