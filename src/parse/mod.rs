//! HTML parsing.
//!
//! Turns a downloaded profile page into a [`ProfilePage`].

mod profile;
mod structured;

pub use profile::{extract_profile, extract_slug, ProfilePage};
pub use structured::{extract_json_ld, extract_open_graph};
