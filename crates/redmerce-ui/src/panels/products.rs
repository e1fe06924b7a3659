//! Product cards for the current recommendation set.

use egui::{self, RichText, ScrollArea, Vec2};
use redmerce_core::saved_items::saved_key;
use redmerce_types::product::Product;
use crate::state::UiState;
use crate::theme::*;

/// Something the user did to a card
#[derive(Debug, Clone, PartialEq)]
pub enum ProductAction {
    Save(Product),
    /// Unsave by key
    Remove(String),
}

/// Render the product grid. Returns the save/unsave clicks of this frame.
pub fn products_panel(ui: &mut egui::Ui, state: &UiState) -> Vec<ProductAction> {
    let mut actions = Vec::new();

    if state.products.is_empty() {
        ui.centered_and_justified(|ui| {
            let hint = if state.busy {
                "Searching…"
            } else {
                "Recommendations will appear here."
            };
            ui.label(RichText::new(hint).color(TEXT_SECONDARY));
        });
        return actions;
    }

    ScrollArea::vertical()
        .id_salt("product_grid")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                for (i, product) in state.products.iter().enumerate() {
                    ui.push_id(i, |ui| {
                        ui.allocate_ui(Vec2::new(CARD_WIDTH, 0.0), |ui| {
                            if let Some(action) = product_card(ui, product, state.is_saved(product)) {
                                actions.push(action);
                            }
                        });
                    });
                }
            });
        });

    actions
}

/// One card. Shared with the saved panel.
pub fn product_card(ui: &mut egui::Ui, product: &Product, saved: bool) -> Option<ProductAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_CARD)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.set_width(CARD_WIDTH - 20.0);

            let name = if product.name.trim().is_empty() { "Unnamed product" } else { product.name.as_str() };
            ui.label(RichText::new(name).color(TEXT_PRIMARY).strong());
            if let Some(brand) = &product.brand {
                ui.label(RichText::new(brand).color(TEXT_SECONDARY).small());
            }

            ui.horizontal(|ui| {
                if let Some(price) = product.formatted_price() {
                    ui.label(RichText::new(price).color(PRICE).strong());
                }
                if let Some(original) = product.formatted_original_price() {
                    ui.label(RichText::new(original).color(TEXT_SECONDARY).small().strikethrough());
                }
            });

            if let Some(rating) = product.rating_value() {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(rating_stars(rating)).color(STAR));
                    let mut detail = format!("{:.1}", rating);
                    if let Some(reviews) = product.reviews_label() {
                        detail = format!("{} · {}", detail, reviews);
                    }
                    ui.label(RichText::new(detail).color(TEXT_SECONDARY).small());
                });
            }

            let (features, more) = product.feature_preview();
            for feature in features {
                ui.label(RichText::new(format!("• {}", feature)).color(TEXT_PRIMARY).small());
            }
            if let Some(more) = more {
                ui.label(RichText::new(more).color(TEXT_SECONDARY).small().italics());
            }

            if let Some(description) = &product.description {
                ui.label(RichText::new(description).color(TEXT_SECONDARY).small());
            }
            if let Some(shipping) = &product.shipping {
                ui.label(RichText::new(format!("Shipping: {}", shipping)).color(TEXT_SECONDARY).small());
            }
            if let Some(source) = &product.source {
                ui.label(RichText::new(format!("Sold by {}", source)).color(TEXT_SECONDARY).small());
            }
            if let Some(image) = product.image() {
                ui.hyperlink_to(RichText::new("Image").small(), image);
            }

            ui.add_space(4.0);
            ui.horizontal(|ui| {
                match product.purchase_link() {
                    Some(link) => {
                        ui.hyperlink_to(RichText::new("View product ↗").strong(), link);
                    }
                    None => {
                        ui.add_enabled(false, egui::Button::new("No link"));
                    }
                }

                match saved_key(product) {
                    Some(key) if saved => {
                        if ui.button(RichText::new("♥ Saved").color(ACCENT)).clicked() {
                            action = Some(ProductAction::Remove(key.to_string()));
                        }
                    }
                    Some(_) => {
                        if ui.button("♡ Save").clicked() {
                            action = Some(ProductAction::Save(product.clone()));
                        }
                    }
                    None => {
                        ui.add_enabled(false, egui::Button::new("♡ Save"))
                            .on_disabled_hover_text("Products without a link cannot be saved");
                    }
                }
            });
        });

    action
}

/// Five-star bar for a 0–5 rating, rounded to the nearest whole star
pub fn rating_stars(rating: f64) -> String {
    let full = rating.clamp(0.0, 5.0).round() as usize;
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}
