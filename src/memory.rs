//! Read access to the emulated address space.

use alloc::vec::Vec;

/// A read-only view of the debugged machine's memory.
///
/// The machine must be paused (or this must be a copy) for as long as the
/// view is in use. The unwinder never writes.
pub trait MemoryView {
    /// Reads the 32-bit word at `address`. `None` means unmapped.
    fn read32(&self, address: u32) -> Option<u32>;
}

impl<F> MemoryView for F
where
    F: Fn(u32) -> Option<u32>,
{
    fn read32(&self, address: u32) -> Option<u32> {
        self(address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Region {
    base: u32,
    words: Vec<u32>,
}

impl Region {
    fn index_of(&self, address: u32) -> Option<usize> {
        let offset = address.checked_sub(self.base)?;
        if offset % 4 != 0 {
            return None;
        }
        let index = (offset / 4) as usize;
        (index < self.words.len()).then_some(index)
    }
}

/// Word-addressed memory made of a few mapped regions. Everything outside
/// them, and every unaligned address, reads as unmapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedMemory {
    regions: Vec<Region>,
}

impl MappedMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `words` starting at `base`. Later mappings shadow earlier ones
    /// where they overlap.
    pub fn map(&mut self, base: u32, words: Vec<u32>) -> &mut Self {
        trace!("mapping {} words at {base:#010x}", words.len());
        self.regions.push(Region { base, words });
        self
    }

    /// Maps little endian `bytes` starting at `base`. A trailing partial word
    /// is zero padded.
    pub fn map_le_bytes(&mut self, base: u32, bytes: &[u8]) -> &mut Self {
        let words = bytes
            .chunks(4)
            .map(|chunk| {
                let mut word = [0; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                u32::from_le_bytes(word)
            })
            .collect();
        self.map(base, words)
    }

    /// Overwrites an already mapped word. Returns `None` if `address` is not
    /// mapped.
    pub fn write32(&mut self, address: u32, value: u32) -> Option<()> {
        let region = self
            .regions
            .iter_mut()
            .rev()
            .find(|region| region.index_of(address).is_some())?;
        let index = region.index_of(address)?;
        region.words[index] = value;
        Some(())
    }
}

impl MemoryView for MappedMemory {
    fn read32(&self, address: u32) -> Option<u32> {
        self.regions
            .iter()
            .rev()
            .find_map(|region| region.index_of(address).map(|index| region.words[index]))
    }
}
