//! Command-line interface for the `xdi` binary.

pub mod args;
pub mod commands;
