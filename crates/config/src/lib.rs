// Configuration loading

pub mod error;
pub mod grid;

pub use error::ConfigError;
pub use grid::GridConfig;
