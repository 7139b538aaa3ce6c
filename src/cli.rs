//! Command-line interface components.

pub mod args;
pub mod commands;

pub use args::{Args, Command, IoArgs};
pub use commands::{run, setup_logging};
