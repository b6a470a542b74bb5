//! # elpack
//!
//! Command-line front end for `elpack-core`. All parsing lives in the core
//! crate; this crate wires configuration, logging and output.

pub mod cli;
pub mod config;
