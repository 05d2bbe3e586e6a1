//! Configuration loader and schema types.
//!
//! This module exposes the settings schema used to drive runtime behavior
//! (timings, discovery roots, logging) and helpers to load it from disk.

mod load;
mod schema;

pub use load::config_home;
pub use schema::*;

#[cfg(test)]
mod tests;
