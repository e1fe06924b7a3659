//! Settings panel — backend endpoint and storage backend, with an explicit
//! Save button and feedback.

use egui::{self, RichText, Vec2};
use redmerce_types::config::{BackendConfig, ClientConfig, StorageBackendType};
use crate::theme::*;

/// What the caller should do after rendering the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    None,
    /// A field was edited; nothing persisted yet
    Changed,
    SaveClicked,
    /// Restore defaults
    ResetClicked,
}

/// Save feedback passed in from the app layer
#[derive(Debug, Clone)]
pub struct SaveFeedback {
    pub message: String,
    pub success: bool,
}

impl SaveFeedback {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { message: message.into(), success: true }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { message: message.into(), success: false }
    }
}

pub fn settings_panel(
    ui: &mut egui::Ui,
    config: &mut ClientConfig,
    feedback: Option<&SaveFeedback>,
) -> SettingsAction {
    let mut action = SettingsAction::None;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .corner_radius(PANEL_ROUNDING)
        .show(ui, |ui| {
            ui.heading(RichText::new("Settings").color(TEXT_PRIMARY));
            ui.separator();

            // ── Backend ──────────────────────────────────────
            ui.label(RichText::new("Backend").color(ACCENT).strong());
            if backend_fields(ui, &mut config.backend) {
                action = SettingsAction::Changed;
            }
            if let Err(e) = config.backend.validate() {
                ui.label(RichText::new(e.to_string()).color(ERROR).small());
            } else {
                ui.label(
                    RichText::new(format!("Chat: {}", config.backend.chat_url()))
                        .color(TEXT_SECONDARY)
                        .small()
                        .monospace(),
                );
            }

            ui.add_space(8.0);
            ui.separator();

            // ── Storage ──────────────────────────────────────
            ui.label(RichText::new("Storage").color(ACCENT).strong());
            ui.label(RichText::new("Backend (applies after reload)").color(TEXT_SECONDARY).small());
            egui::ComboBox::from_id_salt("storage_backend")
                .selected_text(config.storage.backend.label())
                .show_ui(ui, |ui| {
                    for kind in StorageBackendType::all() {
                        if ui
                            .selectable_value(&mut config.storage.backend, kind.clone(), kind.label())
                            .changed()
                        {
                            action = SettingsAction::Changed;
                        }
                    }
                });
            ui.label(
                RichText::new(config.storage.backend.description())
                    .color(TEXT_SECONDARY)
                    .small()
                    .italics(),
            );

            ui.add_space(12.0);
            ui.separator();

            ui.horizontal(|ui| {
                let save = ui.add(
                    egui::Button::new(RichText::new("Save Settings").color(TEXT_PRIMARY).strong())
                        .fill(ACCENT)
                        .corner_radius(PANEL_ROUNDING)
                        .min_size(Vec2::new(120.0, 28.0)),
                );
                if save.clicked() {
                    action = SettingsAction::SaveClicked;
                }
                if ui.button("Defaults").clicked() {
                    action = SettingsAction::ResetClicked;
                }

                if let Some(fb) = feedback {
                    let color = if fb.success { SUCCESS } else { ERROR };
                    ui.label(RichText::new(&fb.message).color(color).small());
                }
            });
        });

    action
}

/// Returns true if any field changed
fn backend_fields(ui: &mut egui::Ui, backend: &mut BackendConfig) -> bool {
    let defaults = BackendConfig::default();
    let mut changed = false;

    for (label, value, hint) in [
        ("Base URL", &mut backend.base_url, defaults.base_url.as_str()),
        ("Chat path", &mut backend.chat_path, defaults.chat_path.as_str()),
        ("Health path", &mut backend.health_path, defaults.health_path.as_str()),
    ] {
        ui.label(RichText::new(label).color(TEXT_SECONDARY).small());
        changed |= ui
            .add(egui::TextEdit::singleline(value).hint_text(hint))
            .changed();
        ui.add_space(2.0);
    }

    changed
}
