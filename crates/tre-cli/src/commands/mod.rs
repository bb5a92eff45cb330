//! CLI subcommand implementations.

pub mod expand;
pub mod extract;
mod util;
