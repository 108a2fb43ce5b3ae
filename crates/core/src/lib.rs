pub mod analyze;
pub mod ayah;
pub mod confidence;
pub mod config;
pub mod emotion;
pub mod explain;
pub mod fallback;
pub mod prompt;
pub mod safety;
pub mod sanitize;
