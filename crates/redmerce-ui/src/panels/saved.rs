//! Saved-items side panel.

use egui::{self, RichText, ScrollArea};
use crate::panels::products::{product_card, ProductAction};
use crate::state::UiState;
use crate::theme::*;

/// Render the saved list. Returns the key of an item the user removed.
pub fn saved_panel(ui: &mut egui::Ui, state: &UiState) -> Option<String> {
    let mut removed = None;

    ui.heading(RichText::new(format!("Saved items ({})", state.saved_count())).color(TEXT_PRIMARY));
    ui.separator();

    if state.saved.is_empty() {
        ui.label(RichText::new("Nothing saved yet. Use ♡ on a product card.").color(TEXT_SECONDARY));
        return None;
    }

    ScrollArea::vertical()
        .id_salt("saved_list")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for (i, product) in state.saved.iter().enumerate() {
                ui.push_id(("saved", i), |ui| {
                    if let Some(ProductAction::Remove(key)) = product_card(ui, product, true) {
                        removed = Some(key);
                    }
                });
                ui.add_space(6.0);
            }
        });

    removed
}
