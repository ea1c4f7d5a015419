//! # Hmily Testkit
//!
//! Test utilities for the Hmily transaction repository.
//!
//! This crate provides:
//! - Temporary repositories with automatic cleanup
//! - Record builders for common coordinator scenarios
//! - Property-based test generators using proptest
//! - Concurrent stress helpers
//!
//! ## Usage
//!
//! ```rust
//! use hmily_testkit::prelude::*;
//! use hmily_repository::HmilyRepository;
//!
//! with_file_repository(|repo| {
//!     let mut tx = transaction(1);
//!     repo.create_hmily_transaction(&mut tx).unwrap();
//!     assert!(repo.find_by_trans_id(1).is_some());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
