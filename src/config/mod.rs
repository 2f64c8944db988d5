// src/config/mod.rs

//! Configuration loading and validation for stylepipe.
//!
//! - `model.rs`: the TOML-backed data model and path groups.
//! - `loader.rs`: reading a config file (or falling back to defaults).
//! - `validate.rs`: turning a raw file into a checked [`ConfigFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default, DEFAULT_CONFIG_FILE};
pub use model::{
    CleanSection, ConfigFile, MinifySection, PathGroup, RawConfigFile, RawPathGroup,
    RawPathsSection, SassSection, WatchRuleConfig,
};
