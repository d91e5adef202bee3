//! Channel list sources: the local template and the remote candidate feed

pub mod feed;
pub mod template;

pub use feed::{CandidateMap, FeedSource, HttpFeedSource, fetch_candidates, merge};
pub use template::{Category, ChannelEntry, ChannelTemplate};
