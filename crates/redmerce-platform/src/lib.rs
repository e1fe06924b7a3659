//! Redmerce platform — browser implementations of the core ports.

pub mod backend;
pub mod storage;
