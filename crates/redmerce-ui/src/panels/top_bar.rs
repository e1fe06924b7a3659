//! Top bar: new-search box, backend status, saved badge, settings toggle.

use egui::{self, Align, Layout, RichText};
use crate::state::{BackendHealth, UiState};
use crate::theme::*;

pub enum TopBarAction {
    None,
    /// Start a new session with this query
    Search(String),
    /// Re-run the health probe
    CheckHealth,
}

pub fn top_bar(ui: &mut egui::Ui, state: &mut UiState) -> TopBarAction {
    let mut action = TopBarAction::None;

    ui.horizontal(|ui| {
        ui.heading(RichText::new("Redmerce").color(ACCENT).strong());
        ui.add_space(12.0);

        let response = ui.add_enabled(
            !state.busy,
            egui::TextEdit::singleline(&mut state.search_text)
                .hint_text("What are you shopping for?")
                .desired_width(320.0),
        );
        let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let search = ui.add_enabled(!state.busy, egui::Button::new("Search"));
        if !state.busy && (enter || search.clicked()) {
            // An empty query is still forwarded: it resets the session.
            action = TopBarAction::Search(state.search_text.trim().to_string());
            state.search_text.clear();
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.selectable_label(state.show_settings, "⚙ Settings").clicked() {
                state.show_settings = !state.show_settings;
            }
            let saved = format!("♥ Saved ({})", state.saved_count());
            if ui.selectable_label(state.show_saved, saved).clicked() {
                state.show_saved = !state.show_saved;
            }

            let color = match state.backend_health {
                BackendHealth::Healthy { .. } => SUCCESS,
                BackendHealth::Unknown | BackendHealth::Checking => TEXT_SECONDARY,
                BackendHealth::Unhealthy { .. } => WARNING,
                BackendHealth::Unreachable { .. } => ERROR,
            };
            let status = ui.add(
                egui::Label::new(RichText::new(state.backend_health.label()).color(color).small())
                    .sense(egui::Sense::click()),
            );
            let status = match &state.backend_health {
                BackendHealth::Unreachable { reason } => status.on_hover_text(reason.as_str()),
                _ => status.on_hover_text("Click to check again"),
            };
            if status.clicked() {
                action = TopBarAction::CheckHealth;
            }
        });
    });

    action
}
