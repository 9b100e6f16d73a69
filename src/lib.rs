//! Library entry point for the retro CLI.

pub mod archive;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod convert;
pub mod dedupe;
pub mod error;
pub mod fetcher;
pub mod installer;
pub mod listing;
pub mod logging;
pub mod model;
pub mod path;
pub mod progress;
pub mod query;
pub mod remote;
pub mod scanner;
pub mod size;
pub mod uninstall;
