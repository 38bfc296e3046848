// src/config/mod.rs

//! Configuration for watchrun.
//!
//! Responsibilities:
//! - Define the TOML-backed project file model (`model.rs`).
//! - Load a project file from disk (`loader.rs`).
//! - Validate what serde cannot (`validate.rs`).
//! - Merge CLI flags, environment and project file into the effective
//!   [`Settings`] (`settings.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ProjectFile, RawProjectFile, RunSection, WatchSection};
pub use settings::{EnvOverrides, Settings, USE_POLLING_ENV};
pub use validate::validate_raw_project;
