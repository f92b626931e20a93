//! CLI module for probeloop - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for flat runs,
//! hierarchical exploration, and configuration inspection.

pub mod commands;

pub use commands::Cli;
