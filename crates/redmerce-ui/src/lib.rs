//! Redmerce UI — egui panels and the display-state projection.

pub mod state;
pub mod theme;
pub mod panels;
