//! Configuration for numgrid
//!
//! Settings live in a single TOML file in the user's config directory and
//! are read at start-up and on an explicit reload.

pub mod settings;

pub use settings::{AppConfig, ConfigError, config_path, load_default_location, load_from};
