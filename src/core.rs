//! # Core Utilities

pub mod generate;
pub mod querystring;
