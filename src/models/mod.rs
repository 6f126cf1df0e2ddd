//! Domain values produced by the backend client.
//!
//! # Key Types
//!
//! - [`FilterModel`] - A compact block filter parsed from its wire line
//! - [`SoftwareVersion`] - Multi-component version with numeric ordering
//! - [`ServerVersions`] - Versions reported by the backend
//! - [`LocalVersions`] - Versions this build was made for
//! - [`CompatibilityReport`] / [`Compatibility`] - Outcome of a version check

pub mod filter;
pub use filter::{FilterModel, FilterParseError};
pub mod version;
pub use version::{Compatibility, CompatibilityReport, LocalVersions, ServerVersions, SoftwareVersion};
