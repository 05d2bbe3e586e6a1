//! Browsing state: the combined folder/track list of the current scope, the
//! selection cursor and its page.

mod model;

pub use model::*;
