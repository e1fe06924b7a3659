pub mod top_bar;
pub mod banner;
pub mod chat;
pub mod products;
pub mod saved;
pub mod settings;
