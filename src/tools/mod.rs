//! Tool implementations for Winx
//!
//! This module contains implementations of the various tools that Winx provides,
//! such as initializing the environment and executing bash commands.

pub mod bash_command;
pub mod context_save;
pub mod file_write_or_edit;
pub mod initialize;
pub mod read_files;
pub mod read_image;

pub use bash_command::*;
pub use context_save::*;
pub use file_write_or_edit::*;
pub use initialize::*;
pub use read_files::*;
pub use read_image::*;
