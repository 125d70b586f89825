pub mod commands;
pub mod display;
pub mod osd;

pub use commands::{CliArgs, Commands};
