//! # es-core
//!
//! Shared foundation for evscan: the error type, 3-vector kinematics and the
//! particle species taxonomy.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod species;
pub mod vecmath;

pub use error::{Error, Result};
pub use species::Species;
pub use vecmath::{Vec3, Vec3f};

/// evscan version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
