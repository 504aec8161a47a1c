//! Plugdock Core Library
//!
//! This crate provides the pieces shared by every Plugdock crate:
//! configuration management and error handling.

pub mod config;
pub mod error;

pub use error::{Error, Result};

/// Plugdock version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
