//! Dismissible error banner for transport failures.

use egui::{self, RichText};
use crate::state::UiState;
use crate::theme::*;

/// Render the banner if there is an error. Returns true when dismissed.
pub fn error_banner(ui: &mut egui::Ui, state: &UiState) -> bool {
    let Some(message) = &state.error_banner else {
        return false;
    };
    let mut dismissed = false;

    egui::Frame::default()
        .fill(ERROR_BG)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("⚠").color(ERROR).strong());
                ui.label(RichText::new(message).color(TEXT_PRIMARY));
                if ui.small_button("Dismiss").clicked() {
                    dismissed = true;
                }
            });
        });

    dismissed
}
