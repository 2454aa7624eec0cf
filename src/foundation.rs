//! Shared leaf types and the crate error taxonomy.

pub mod core;
pub mod error;
