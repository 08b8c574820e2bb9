// Application layer: the AI-backed features and the command loop that drives
// them against the store.

pub mod app;
pub mod coach;
pub mod design;
pub mod image_import;
pub mod protocol;
pub mod simulator;
pub mod testing;
pub mod visualizer;
