// src/config/mod.rs

//! Build configuration: the optional `Dagbuild.toml` file and the validated
//! options handed to the engine.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{BuildOptions, BuildSection, ConfigFile, RawConfigFile, WorkflowSection};
pub use validate::parse_duration;
