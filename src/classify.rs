//! Instruction classification.
//!
//! The unwinder does not know any instruction encoding. It only asks a
//! [`Classify`] implementation what a word *does* to control flow and to the
//! stack, see [`crate::arch`] for concrete ones.

/// What a single instruction word means to the unwinder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Anything else. This is what most instructions are.
    Unknown,
    /// A call that writes the return address register. Carries the target when
    /// the word encodes one. That target may be relative to a segment of the
    /// address space, e.g. MIPS `jal` leaves the upper four bits to the pc.
    Call(Option<u32>),
    /// Return to the address in the return address register.
    Return,
    /// The stack pointer is moved by the given amount of bytes (negative
    /// allocates). `None` if the new value comes from somewhere the word does
    /// not tell us, like another register.
    StackAdjust(Option<i32>),
    /// The return address register is stored to the stack, at this byte offset
    /// from the stack pointer as it is when the store executes.
    SaveLinkRegister(i32),
}

/// Turns instruction words into [`Instruction`]s.
///
/// Implementations must be pure: the same word always classifies the same way
/// and every bit pattern has an answer.
pub trait Classify {
    fn classify(&self, word: u32) -> Instruction;

    /// How many instruction slots a return occupies. Architectures with a
    /// branch delay slot execute one more instruction after the return itself.
    fn return_width(&self) -> u32 {
        1
    }
}

impl<F> Classify for F
where
    F: Fn(u32) -> Instruction,
{
    fn classify(&self, word: u32) -> Instruction {
        self(word)
    }
}
