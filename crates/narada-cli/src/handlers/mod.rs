//! Command handlers that delegate to the runtime.
//!
//! Handlers follow one pattern: take the [`CliContext`](crate::CliContext)
//! and parsed arguments, call the runtime or a store, and format the result
//! for the terminal. They hold no supervision state of their own.

pub mod analyzer;
pub mod console;
pub mod license;
pub mod paths;
pub mod presets;
pub mod run;
pub mod settings;
pub mod streams;
