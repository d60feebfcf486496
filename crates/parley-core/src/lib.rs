//! # parley-core
//!
//! Core types, traits, and abstractions for the parley platform.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other parley crates depend on.

pub mod admission;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use admission::{detect_content_type, is_admitted_type, sanitize_filename};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
