//! Reddit ingestion: outbound client and the fixed-interval poller

pub mod poller;
pub mod reddit;

pub use poller::IngestPoller;
pub use reddit::{RedditClient, RedditPost};
