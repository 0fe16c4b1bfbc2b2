pub mod flag;
pub mod manifest;
pub mod toml_loader;
/// Manifest validation.
pub mod validation;

pub use flag::Flag;
pub use manifest::Manifest;
