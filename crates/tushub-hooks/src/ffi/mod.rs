//! C ABI for shared library hooks.

pub mod abi;
pub mod safety;
