//! CLI subcommand implementations.

pub mod compute;
pub mod sessions;
pub mod track;
