//! Doorscan library crate
//!
//! This crate provides both a CLI binary and a library API for programmatic use

pub mod badge;
pub mod cli;
pub mod config;
pub mod history;
pub mod output;
pub mod record;
pub mod resolver;
pub mod session;
pub mod station;
pub mod theme;
