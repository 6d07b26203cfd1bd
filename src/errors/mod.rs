//! Error types and error handling for the semantic analyser.
//!
//! This module defines the error types used throughout type checking.
//! It includes:
//!
//! - Error structures with source position information
//! - Specific error variants for extension binding, known protocols and
//!   internal consistency failures
//! - The diagnostic engine that collects user-facing errors
//! - Helpful error messages and suggestions

pub mod diagnostics;
pub mod errors;
