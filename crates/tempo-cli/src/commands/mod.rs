//! CLI subcommand implementations.

pub mod entries;
pub mod export;
pub mod project;
pub mod report;
pub mod start;
pub mod status;
pub mod stop;
