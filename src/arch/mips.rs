//! MIPS (R3000, R4000 and the 128-bit EE variant) instruction classification.
//!
//! Compilers for these targets emit a very regular prologue:
//!
//! ```text
//! addiu sp, sp, -N
//! sw    ra, M(sp)      # or sd/sq on 64/128-bit cores
//! ```
//!
//! and return with `jr ra` followed by a delay slot, which usually releases
//! the frame.

#[cfg(test)]
mod tests;

use crate::classify::{Classify, Instruction};

const SP: u32 = 29;
const RA: u32 = 31;

const OP_SPECIAL: u32 = 0x00;
const OP_REGIMM: u32 = 0x01;
const OP_JAL: u32 = 0x03;
const OP_ADDI: u32 = 0x08;
const OP_ADDIU: u32 = 0x09;
const OP_DADDI: u32 = 0x18;
const OP_DADDIU: u32 = 0x19;
const OP_SQ: u32 = 0x1F;
const OP_LW: u32 = 0x23;
const OP_SW: u32 = 0x2B;
const OP_SD: u32 = 0x3F;

const FUNCT_JR: u32 = 0x08;
const FUNCT_JALR: u32 = 0x09;
const FUNCT_ADD: u32 = 0x20;
const FUNCT_ADDU: u32 = 0x21;
const FUNCT_SUB: u32 = 0x22;
const FUNCT_SUBU: u32 = 0x23;
const FUNCT_OR: u32 = 0x25;
const FUNCT_DADD: u32 = 0x2C;
const FUNCT_DADDU: u32 = 0x2D;
const FUNCT_DSUB: u32 = 0x2E;
const FUNCT_DSUBU: u32 = 0x2F;

const RT_BLTZAL: u32 = 0x10;
const RT_BGEZAL: u32 = 0x11;
const RT_BLTZALL: u32 = 0x12;
const RT_BGEZALL: u32 = 0x13;

/// Classifier for MIPS code. Returns are two slots wide because of the
/// branch delay slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mips;

#[derive(Clone, Copy)]
struct Fields(u32);

impl Fields {
    fn op(self) -> u32 {
        self.0 >> 26
    }
    fn rs(self) -> u32 {
        (self.0 >> 21) & 0x1F
    }
    fn rt(self) -> u32 {
        (self.0 >> 16) & 0x1F
    }
    fn rd(self) -> u32 {
        (self.0 >> 11) & 0x1F
    }
    fn funct(self) -> u32 {
        self.0 & 0x3F
    }
    fn simm(self) -> i32 {
        self.0 as u16 as i16 as i32
    }
    fn jump_index(self) -> u32 {
        self.0 & 0x03FF_FFFF
    }
}

impl Classify for Mips {
    fn classify(&self, word: u32) -> Instruction {
        let f = Fields(word);
        match f.op() {
            OP_SPECIAL => match f.funct() {
                FUNCT_JR if f.rs() == RA => Instruction::Return,
                FUNCT_JALR => Instruction::Call(None),
                FUNCT_ADD | FUNCT_ADDU | FUNCT_SUB | FUNCT_SUBU | FUNCT_OR | FUNCT_DADD
                | FUNCT_DADDU | FUNCT_DSUB | FUNCT_DSUBU
                    if f.rd() == SP =>
                {
                    Instruction::StackAdjust(None)
                }
                _ => Instruction::Unknown,
            },
            OP_REGIMM => match f.rt() {
                RT_BLTZAL | RT_BGEZAL | RT_BLTZALL | RT_BGEZALL => Instruction::Call(None),
                _ => Instruction::Unknown,
            },
            // The upper four bits come from the address of the delay slot,
            // which a lone word does not know.
            OP_JAL => Instruction::Call(Some(f.jump_index() << 2)),
            OP_ADDI | OP_ADDIU | OP_DADDI | OP_DADDIU if f.rs() == SP && f.rt() == SP => {
                Instruction::StackAdjust(Some(f.simm()))
            }
            OP_SW | OP_SD | OP_SQ if f.rs() == SP && f.rt() == RA => {
                Instruction::SaveLinkRegister(f.simm())
            }
            _ => Instruction::Unknown,
        }
    }

    fn return_width(&self) -> u32 {
        2
    }
}

/// Assembles the handful of instructions the unwinder cares about. Handy for
/// building test images.
pub mod encode {
    use super::*;

    pub const NOP: u32 = 0;

    fn itype(op: u32, rs: u32, rt: u32, imm: i16) -> u32 {
        (op << 26) | (rs << 21) | (rt << 16) | (imm as u16 as u32)
    }

    /// `addiu sp, sp, imm`
    pub fn addiu_sp(imm: i16) -> u32 {
        itype(OP_ADDIU, SP, SP, imm)
    }

    /// `sw ra, offset(sp)`
    pub fn sw_ra(offset: i16) -> u32 {
        itype(OP_SW, SP, RA, offset)
    }

    /// `sd ra, offset(sp)`
    pub fn sd_ra(offset: i16) -> u32 {
        itype(OP_SD, SP, RA, offset)
    }

    /// `lw ra, offset(sp)`
    pub fn lw_ra(offset: i16) -> u32 {
        itype(OP_LW, SP, RA, offset)
    }

    /// `jr ra`
    pub fn jr_ra() -> u32 {
        (RA << 21) | FUNCT_JR
    }

    /// `jal target`, `target` must be in the same 256 MiB segment as the call.
    pub fn jal(target: u32) -> u32 {
        (OP_JAL << 26) | ((target >> 2) & 0x03FF_FFFF)
    }
}
