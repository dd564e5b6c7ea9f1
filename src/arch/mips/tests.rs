use super::{encode, Mips};
use crate::classify::{Classify, Instruction};

fn classify(word: u32) -> Instruction {
    Mips.classify(word)
}

#[test]
fn prologue_and_epilogue() {
    // addiu sp, sp, -32
    assert_eq!(classify(0x27BD_FFE0), Instruction::StackAdjust(Some(-32)));
    // sw ra, 28(sp)
    assert_eq!(classify(0xAFBF_001C), Instruction::SaveLinkRegister(28));
    // lw ra, 28(sp)
    assert_eq!(classify(0x8FBF_001C), Instruction::Unknown);
    // jr ra
    assert_eq!(classify(0x03E0_0008), Instruction::Return);
    // addiu sp, sp, 32
    assert_eq!(classify(0x27BD_0020), Instruction::StackAdjust(Some(32)));
}

#[test]
fn wide_link_register_saves() {
    // sd ra, 16(sp)
    assert_eq!(classify(0xFFBF_0010), Instruction::SaveLinkRegister(16));
    // sq ra, 0(sp)
    assert_eq!(classify(0x7FBF_0000), Instruction::SaveLinkRegister(0));
    // daddiu sp, sp, -64
    assert_eq!(classify(0x67BD_FFC0), Instruction::StackAdjust(Some(-64)));
}

#[test]
fn calls() {
    assert_eq!(classify(0x0C04_0000), Instruction::Call(Some(0x0010_0000)));
    // jalr t9
    assert_eq!(classify(0x0320_F809), Instruction::Call(None));
    // bal +4 (bgezal zero)
    assert_eq!(classify(0x0411_0001), Instruction::Call(None));
}

#[test]
fn register_writes_to_sp_are_dynamic() {
    // addu sp, sp, t0
    assert_eq!(classify(0x03A8_E821), Instruction::StackAdjust(None));
    // move sp, s8 (or sp, s8, zero)
    assert_eq!(classify(0x03C0_E825), Instruction::StackAdjust(None));
}

#[test]
fn lookalikes_are_unknown() {
    assert_eq!(classify(encode::NOP), Instruction::Unknown);
    // jr t9, a tail call rather than a return
    assert_eq!(classify(0x0320_0008), Instruction::Unknown);
    // addiu a0, sp, 16
    assert_eq!(classify(0x27A4_0010), Instruction::Unknown);
    // sw ra, 0(a0)
    assert_eq!(classify(0xAC9F_0000), Instruction::Unknown);
    // sw s0, 0(sp)
    assert_eq!(classify(0xAFB0_0000), Instruction::Unknown);
}

#[test]
fn encoder_agrees_with_classifier() {
    assert_eq!(encode::addiu_sp(-32), 0x27BD_FFE0);
    assert_eq!(encode::sw_ra(28), 0xAFBF_001C);
    assert_eq!(encode::lw_ra(28), 0x8FBF_001C);
    assert_eq!(encode::jr_ra(), 0x03E0_0008);
    assert_eq!(encode::jal(0x0010_0000), 0x0C04_0000);
    assert_eq!(classify(encode::sd_ra(-8)), Instruction::SaveLinkRegister(-8));
}

#[test]
fn returns_have_a_delay_slot() {
    assert_eq!(Mips.return_width(), 2);
}

#[test]
fn jal_target_is_segment_relative() {
    // jal 0x80100000 from KSEG0 keeps only the low 28 bits.
    assert_eq!(
        classify(encode::jal(0x8010_0000)),
        Instruction::Call(Some(0x0010_0000))
    );
}
