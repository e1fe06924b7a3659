//! Redmerce core — conversation protocol logic with no platform dependencies.

pub mod ports;
pub mod event_bus;
pub mod normalizer;
pub mod session;
pub mod saved_items;

#[cfg(test)]
mod tests;
