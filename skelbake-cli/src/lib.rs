//! skelbake CLI library
//!
//! Argument definitions and command implementations behind the `skelbake`
//! binary.

pub mod cli;
pub mod commands;
pub mod utils;
