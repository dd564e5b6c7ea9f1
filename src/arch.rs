//! Concrete [`Classify`](crate::Classify) implementations.

pub mod mips;
