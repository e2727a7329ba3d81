//! Core types for the Covenant contract engine
//!
//! This crate provides the building blocks shared by the parser, the
//! expression interpreter and the contract enforcer:
//! - Runtime value representation, including live object references
//! - The per-check execution context ([`TestContext`])

pub mod context;
pub mod value;

pub use context::{Instance, TestContext};
pub use value::{Object, ObjectRef, Value, ValueError, ValueResult};
