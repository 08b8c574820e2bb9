// Mobi Design: place catalog furniture into a client's room photo.

pub mod catalog;
pub mod pipeline;

pub use catalog::{FurnitureFamily, FurnitureItem, FurnitureSelection};
pub use pipeline::{DesignCompositor, DesignError, DesignInput, EnhancedPrompt, ResultState};
