//! Rows for a call stack list in a debugger front end. Drawing them is the
//! front end's business.

use alloc::{format, string::String, vec, vec::Vec};

use crate::{identify::SymbolResolver, walk::CallStack};

/// Shown as the only row when no frame could be recovered.
pub const UNAVAILABLE: &str = "Call stack unavailable at this state.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRow {
    pub function: String,
    pub caller: String,
    /// Address to jump to when the row is activated.
    pub target: Option<u32>,
}

pub fn rows<S>(stack: &CallStack, symbols: &S) -> Vec<FrameRow>
where
    S: SymbolResolver + ?Sized,
{
    if stack.is_unavailable() {
        return vec![FrameRow {
            function: UNAVAILABLE.into(),
            caller: String::new(),
            target: None,
        }];
    }

    stack
        .frames()
        .iter()
        .map(|frame| {
            let mut function = format!("0x{:08X}", frame.function_entry);
            if let Some(name) = symbols.resolve_name(frame.function_entry) {
                function.push_str(&format!(" ({name})"));
            }
            FrameRow {
                function,
                caller: format!("0x{:08X}", frame.return_address),
                target: Some(frame.function_entry),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        identify::SymbolTable, memory::MappedMemory, unwind, EngineConfig, Instruction,
        RegisterSnapshot,
    };

    #[test]
    fn unavailable_row() {
        let memory = MappedMemory::new();
        let stack = unwind(
            &RegisterSnapshot::new(0x1000, 0x2000, 0x3000),
            &memory,
            &|_: u32| Instruction::Unknown,
            &EngineConfig::default(),
        );

        assert_eq!(
            rows(&stack, &()),
            vec![FrameRow {
                function: UNAVAILABLE.into(),
                caller: String::new(),
                target: None,
            }]
        );
    }

    #[test]
    fn names_and_hex() {
        // Return at 0x0FFC, a leaf at 0x1000.
        let mut memory = MappedMemory::new();
        memory.map(0x0FFC, vec![1, 0, 0, 0]);
        let classify = |word: u32| match word {
            1 => Instruction::Return,
            _ => Instruction::Unknown,
        };
        let stack = unwind(
            &RegisterSnapshot::new(0x1008, 0x2000, 0xABCD_EF00),
            &memory,
            &classify,
            &EngineConfig::default(),
        );

        let symbols: SymbolTable = [(0x1000, "leaf")].into_iter().collect();
        assert_eq!(
            rows(&stack, &symbols),
            vec![FrameRow {
                function: "0x00001000 (leaf)".into(),
                caller: "0xABCDEF00".into(),
                target: Some(0x1000),
            }]
        );
        assert_eq!(rows(&stack, &())[0].function, "0x00001000");
    }
}
