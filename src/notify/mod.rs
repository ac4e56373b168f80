//! Scan output.
//!
//! This module handles:
//! - Colored console output and progress
//! - JSON report printing

pub mod console;

pub use console::ConsoleOutput;
