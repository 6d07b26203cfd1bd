//! Type checking driver and scheduling.
//!
//! This module drives semantic analysis of a name-bound source file. It
//! does not infer types itself; the passes that do are reached through the
//! `SemanticCollaborator` trait. What it owns:
//!
//! - The worklist scheduler that checks every function body exactly once
//! - Binding extensions to the nominal types they extend
//! - The syntactic known-protocol gate for eager validation
//! - Mapping literals to the protocols their default types need
//! - Inferring implicit `final` on members that are never overridden
//!
//! Every declaration reaches a terminal validation state, and user errors
//! are reported through the diagnostic engine without stopping the run.

pub mod collaborator;
pub mod conformance;
pub mod driver;
pub mod extensions;
pub mod literals;
pub mod sealing;
pub mod type_checker;
pub mod worklist;

#[cfg(test)]
mod tests;
