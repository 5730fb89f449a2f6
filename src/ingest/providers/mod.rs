pub mod feed_api;
pub mod scripted;

pub use feed_api::FeedApiProvider;
pub use scripted::ScriptedProvider;
