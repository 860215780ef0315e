//! CLI domain: parse and route for the demo binary.

mod parse;
mod route;

pub use parse::{Cli, Commands};
pub use route::{RunContext, RunSummary};
