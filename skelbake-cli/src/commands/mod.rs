//! Command implementations

pub mod bake;
pub mod info;
