//! Data models

pub mod disaster;
pub mod prediction;

pub use disaster::*;
pub use prediction::*;
