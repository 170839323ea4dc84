//! # Domain Module
//!
//! Block records, block metadata cache, errors and per-block stats.

pub mod block_meta;
pub mod entities;
pub mod errors;
pub mod stats;

pub use block_meta::*;
pub use entities::*;
pub use errors::*;
pub use stats::*;
