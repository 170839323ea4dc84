//! # Application Module
//!
//! Block line decoder and the stream driver built on it.

pub mod decoder;
pub mod reader;

pub use decoder::BlockLineDecoder;
pub use reader::ConsoleReader;
