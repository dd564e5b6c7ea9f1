//! Walking the call stack.
//!
//! Each step takes a `(pc, sp)` pair, finds the start of the function `pc` is
//! in, then replays that function's instructions from its start up to `pc`
//! to learn two things:
//! - where (if anywhere) the return address register was stored, relative to
//!   the current stack pointer
//! - how far the stack pointer moved, so we know the caller's stack pointer
//!
//! That gives us the caller's `(pc, sp)`, and we go again.

pub mod boundary;


use alloc::{collections::BTreeSet, vec::Vec};
use core::fmt;

use crate::{
    classify::{Classify, Instruction},
    config::EngineConfig,
    memory::MemoryView,
    INSTRUCTION_SIZE,
};
use boundary::{locate_function_start, BoundaryNotFound};

/// The registers the unwinder starts from, captured while the machine is
/// stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub program_counter: u32,
    pub stack_pointer: u32,
    /// The link register (`ra` on MIPS).
    pub return_address: u32,
}

impl RegisterSnapshot {
    pub fn new(program_counter: u32, stack_pointer: u32, return_address: u32) -> Self {
        Self {
            program_counter,
            stack_pointer,
            return_address,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallFrame {
    /// Where the function of this frame (probably) starts. Never above the pc
    /// the frame was found from, so it is a fine target for "go to address".
    pub function_entry: u32,
    /// Where the caller continues once this function returns.
    pub return_address: u32,
}

/// Why a walk stopped. None of these are errors, every walk ends in one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No function start was found for the current pc.
    BoundaryNotFound,
    /// The current pc or a saved return address slot is not mapped.
    UnmappedRead { address: u32 },
    /// A stack pointer change could not be computed, so the caller's stack
    /// pointer (or the saved return address slot) is unknown.
    UnresolvedStackDelta,
    /// The caller would be a pc we have already been at.
    Cycle { pc: u32 },
    /// [`EngineConfig::max_frame_depth`] frames were produced.
    MaxDepthReached,
    /// The innermost function never stored its return address, so the link
    /// register from the snapshot was used. Nothing deeper can be recovered.
    LeafFrame,
    /// A frame below the innermost one never stored its return address.
    ReturnAddressNotSaved,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::BoundaryNotFound => f.write_str("no function boundary found"),
            Termination::UnmappedRead { address } => {
                write!(f, "read of unmapped address {address:#010x}")
            }
            Termination::UnresolvedStackDelta => f.write_str("stack pointer change is unknown"),
            Termination::Cycle { pc } => write!(f, "pc {pc:#010x} was already visited"),
            Termination::MaxDepthReached => f.write_str("maximum frame depth reached"),
            Termination::LeafFrame => f.write_str("innermost function is a leaf"),
            Termination::ReturnAddressNotSaved => f.write_str("return address was never saved"),
        }
    }
}

/// The reconstructed call stack, innermost frame first.
///
/// An empty stack means the stack is unavailable at this state. A non-empty
/// one may still be cut short, see [`CallStack::termination`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    termination: Termination,
}

impl CallStack {
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn is_unavailable(&self) -> bool {
        self.frames.is_empty()
    }
}

impl<'a> IntoIterator for &'a CallStack {
    type Item = &'a CallFrame;
    type IntoIter = core::slice::Iter<'a, CallFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Where the return address was stored.
#[derive(Debug, Clone, Copy)]
struct LinkSave {
    at: u32,
    offset: i32,
    /// Stack pointer movement between the store and the pc.
    delta_after: Option<i64>,
}

impl LinkSave {
    fn slot(&self, sp: u32) -> Option<u32> {
        let relative = i64::from(self.offset).checked_sub(self.delta_after?)?;
        offset_address(sp, relative)
    }
}

/// What replaying a function from its start up to the pc told us.
#[derive(Debug)]
struct Body {
    /// Stack pointer movement between the function start and the pc.
    net_delta: Option<i64>,
    link_save: Option<LinkSave>,
}

fn add_delta(sum: Option<i64>, delta: Option<i32>) -> Option<i64> {
    sum?.checked_add(i64::from(delta?))
}

fn offset_address(base: u32, offset: i64) -> Option<u32> {
    u32::try_from(i64::from(base).checked_add(offset)?).ok()
}

/// Replays `[start, pc)`. The first return address store wins.
fn scan_body<M, C>(start: u32, pc: u32, memory: &M, classifier: &C) -> Result<Body, Termination>
where
    M: MemoryView + ?Sized,
    C: Classify + ?Sized,
{
    let mut body = Body {
        net_delta: Some(0),
        link_save: None,
    };

    let mut at = start;
    while at < pc {
        let word = memory
            .read32(at)
            .ok_or(Termination::UnmappedRead { address: at })?;

        match classifier.classify(word) {
            Instruction::StackAdjust(delta) => {
                body.net_delta = add_delta(body.net_delta, delta);
                if let Some(save) = &mut body.link_save {
                    save.delta_after = add_delta(save.delta_after, delta);
                }
            }
            Instruction::SaveLinkRegister(offset) if body.link_save.is_none() => {
                trace!("return address stored at {at:#010x}, sp{offset:+}");
                body.link_save = Some(LinkSave {
                    at,
                    offset,
                    delta_after: Some(0),
                });
            }
            _ => {}
        }

        match at.checked_add(INSTRUCTION_SIZE) {
            Some(next) => at = next,
            None => break,
        }
    }

    Ok(body)
}

/// Reconstructs the call stack of a stopped machine.
///
/// The walk is deterministic and bounded: every boundary search reads at most
/// [`EngineConfig::max_scan_distance`] words, at most
/// [`EngineConfig::max_frame_depth`] frames are produced and no pc is visited
/// twice. It never fails, it only stops early.
#[instrument(
    level = "debug",
    skip_all,
    fields(
        pc = %format_args!("{:#010x}", snapshot.program_counter),
        sp = %format_args!("{:#010x}", snapshot.stack_pointer),
    )
)]
pub fn unwind<M, C>(
    snapshot: &RegisterSnapshot,
    memory: &M,
    classifier: &C,
    config: &EngineConfig,
) -> CallStack
where
    M: MemoryView + ?Sized,
    C: Classify + ?Sized,
{
    let mut frames = Vec::new();
    let mut visited = BTreeSet::new();

    let mut pc = snapshot.program_counter;
    let mut sp = snapshot.stack_pointer;
    visited.insert(pc);

    let termination = loop {
        trace!(depth = frames.len(), "unwinding pc={pc:#010x} sp={sp:#010x}");

        if memory.read32(pc).is_none() {
            break Termination::UnmappedRead { address: pc };
        }

        let function_entry = match locate_function_start(pc, memory, classifier, config) {
            Ok(start) => {
                debug!(heuristic = ?start.heuristic, "function starts at {:#010x}", start.address);
                start.address
            }
            Err(BoundaryNotFound) => break Termination::BoundaryNotFound,
        };

        let body = match scan_body(function_entry, pc, memory, classifier) {
            Ok(body) => body,
            Err(termination) => break termination,
        };

        let return_address = match body.link_save {
            Some(save) => {
                let Some(slot) = save.slot(sp) else {
                    debug!("cannot locate the slot written at {:#010x}", save.at);
                    break Termination::UnresolvedStackDelta;
                };
                match memory.read32(slot) {
                    Some(value) => value,
                    None => break Termination::UnmappedRead { address: slot },
                }
            }
            None if frames.is_empty() => {
                frames.push(CallFrame {
                    function_entry,
                    return_address: snapshot.return_address,
                });
                break Termination::LeafFrame;
            }
            None => break Termination::ReturnAddressNotSaved,
        };

        frames.push(CallFrame {
            function_entry,
            return_address,
        });

        let Some(caller_sp) = body
            .net_delta
            .and_then(|net| offset_address(sp, net.checked_neg()?))
        else {
            break Termination::UnresolvedStackDelta;
        };

        if !visited.insert(return_address) {
            break Termination::Cycle {
                pc: return_address,
            };
        }

        if frames.len() >= config.max_frame_depth() {
            break Termination::MaxDepthReached;
        }

        pc = return_address;
        sp = caller_sp;
    };

    debug!(frames = frames.len(), "walk stopped: {termination}");

    CallStack {
        frames,
        termination,
    }
}
