// Command handlers module
// This module contains all CLI command implementations

pub mod common;
pub mod completion;
pub mod list;
pub mod remove;
pub mod repo;
pub mod shell_init;
pub mod switch;
