//! Colours and spacing for the storefront look

use egui::{Color32, CornerRadius, Stroke, Vec2};

pub const BG_PRIMARY: Color32 = Color32::from_rgb(20, 20, 24);
pub const BG_SECONDARY: Color32 = Color32::from_rgb(34, 34, 40);
pub const BG_CARD: Color32 = Color32::from_rgb(44, 44, 52);
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(235, 235, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(150, 150, 165);
pub const ACCENT: Color32 = Color32::from_rgb(220, 38, 38);
pub const PRICE: Color32 = Color32::from_rgb(250, 204, 21);
pub const STAR: Color32 = Color32::from_rgb(251, 191, 36);
pub const SUCCESS: Color32 = Color32::from_rgb(34, 197, 94);
pub const ERROR: Color32 = Color32::from_rgb(239, 68, 68);
pub const ERROR_BG: Color32 = Color32::from_rgb(60, 22, 22);
pub const WARNING: Color32 = Color32::from_rgb(234, 179, 8);

pub const CARD_WIDTH: f32 = 240.0;
pub const PANEL_ROUNDING: CornerRadius = CornerRadius::same(8);
pub const PANEL_PADDING: Vec2 = Vec2::new(12.0, 8.0);

pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    let visuals = &mut style.visuals;

    visuals.dark_mode = true;
    visuals.panel_fill = BG_PRIMARY;
    visuals.window_fill = BG_SECONDARY;
    visuals.extreme_bg_color = BG_PRIMARY;
    visuals.hyperlink_color = ACCENT.gamma_multiply(1.3);

    for (widgets, fill, fg) in [
        (&mut visuals.widgets.inactive, BG_CARD, TEXT_SECONDARY),
        (&mut visuals.widgets.hovered, BG_CARD, TEXT_PRIMARY),
        (&mut visuals.widgets.active, ACCENT, TEXT_PRIMARY),
    ] {
        widgets.bg_fill = fill;
        widgets.fg_stroke = Stroke::new(1.0, fg);
    }

    visuals.selection.bg_fill = ACCENT.linear_multiply(0.35);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    style.spacing.item_spacing = Vec2::new(8.0, 6.0);
    ctx.set_style(style);
}
