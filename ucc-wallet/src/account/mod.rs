//! Account management functionality
//!
//! This module provides the dual-format address codec, identity derivation
//! and identity persistence.

pub mod address;
pub mod identity;
pub mod store;

pub use address::*;
pub use identity::*;
pub use store::*;
