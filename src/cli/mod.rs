//! CLI module for the zeropamine timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic

pub mod commands;
pub mod display;

pub use commands::{Cli, Commands, PreviewArgs, RunArgs, SettingsAction, SettingsSetArgs};
pub use display::Display;
