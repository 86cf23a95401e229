//! Zone tracker CLI library.
//!
//! This crate provides the operator interface for recording zone intervals
//! and deriving the binned matrices.

mod cli;
pub mod command;
pub mod commands;
mod config;
pub mod exports;
pub mod table;

pub use cli::{Cli, Commands};
pub use config::Config;
