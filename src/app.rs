//! Application model: routes user and remote input onto the navigation
//! state and the playback controller, and persists preferences.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
