//! Chat panel — the conversation log and the follow-up input.

use egui::{self, RichText, ScrollArea, Vec2};
use redmerce_types::message::{ChatMessage, MessageRole};
use crate::state::UiState;
use crate::theme::*;

/// Render the chat panel. Returns the trimmed follow-up text when the user
/// sends one. Input is disabled while a reply is pending.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<String> {
    let mut submitted = None;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            if let Some(query) = &state.original_query {
                ui.label(RichText::new(format!("Searching: {}", query)).color(TEXT_SECONDARY).small());
                ui.separator();
            }

            let log_height = (ui.available_height() - 48.0).max(80.0);
            ScrollArea::vertical()
                .max_height(log_height)
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    if state.messages.is_empty() {
                        ui.label(
                            RichText::new("Ask for a product to get started.")
                                .color(TEXT_SECONDARY)
                                .italics(),
                        );
                    }
                    for message in &state.messages {
                        render_message(ui, message);
                        ui.add_space(4.0);
                    }
                    if state.busy {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(RichText::new("Thinking…").color(TEXT_SECONDARY).small());
                        });
                    }
                });

            ui.add_space(6.0);

            let can_send = !state.busy && !state.is_landing();
            ui.horizontal(|ui| {
                let hint = if state.is_landing() {
                    "Start with a search above"
                } else {
                    "Ask a follow-up question..."
                };
                let response = ui.add_enabled(
                    can_send,
                    egui::TextEdit::singleline(&mut state.input_text)
                        .hint_text(hint)
                        .desired_width(ui.available_width() - 70.0),
                );

                let has_text = !state.input_text.trim().is_empty();
                let send = ui.add_enabled(
                    can_send && has_text,
                    egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                        .fill(if can_send && has_text { ACCENT } else { BG_CARD })
                        .corner_radius(PANEL_ROUNDING)
                        .min_size(Vec2::new(60.0, 0.0)),
                );

                let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if can_send && has_text && (enter || send.clicked()) {
                    submitted = Some(state.input_text.trim().to_string());
                    state.input_text.clear();
                    response.request_focus();
                }
            });
        });

    submitted
}

/// Display label and colour for a log entry
pub fn role_style(role: MessageRole) -> (&'static str, egui::Color32) {
    match role {
        MessageRole::User => ("You", ACCENT),
        MessageRole::Agent => ("Assistant", SUCCESS),
        MessageRole::Error => ("Error", ERROR),
    }
}

fn render_message(ui: &mut egui::Ui, message: &ChatMessage) {
    let (label, color) = role_style(message.role);
    let fill = if message.role == MessageRole::Error { ERROR_BG } else { BG_CARD };

    egui::Frame::default()
        .fill(fill)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(label).color(color).strong().small());
                ui.label(
                    RichText::new(message.timestamp.format("%H:%M").to_string())
                        .color(TEXT_SECONDARY)
                        .small(),
                );
            });
            ui.label(RichText::new(&message.content).color(TEXT_PRIMARY));
        });
}
