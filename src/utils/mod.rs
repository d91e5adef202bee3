//! Utility modules shared by the sources and services layers

pub mod channel_name;
pub mod resolution;
pub mod url;

pub use channel_name::{ChannelKey, normalize};
pub use resolution::Resolution;
