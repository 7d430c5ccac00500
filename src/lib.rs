//! Pieceworks - shatter images into puzzles and put them back together
//!
//! File-level layer over the `tessera` crate: PNG I/O, piece directories,
//! JSON sidecars and configuration.
//! This library exposes modules for integration testing.

pub mod error;
pub mod models;
pub mod rendering;
pub mod services;
