//! Naming addresses for display. Never used to make unwinding decisions.

use alloc::{collections::BTreeMap, string::String};

pub trait SymbolResolver {
    /// The name of the function that starts exactly at `address`, if known.
    fn resolve_name(&self, address: u32) -> Option<&str>;
}

/// No symbols at all.
impl SymbolResolver for () {
    fn resolve_name(&self, _address: u32) -> Option<&str> {
        None
    }
}

/// Function names keyed by their entry address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    names: BTreeMap<u32, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: u32, name: impl Into<String>) -> Option<String> {
        self.names.insert(address, name.into())
    }
}

impl SymbolResolver for SymbolTable {
    fn resolve_name(&self, address: u32) -> Option<&str> {
        self.names.get(&address).map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<(u32, S)> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = (u32, S)>>(iter: I) -> Self {
        Self {
            names: iter
                .into_iter()
                .map(|(address, name)| (address, name.into()))
                .collect(),
        }
    }
}
