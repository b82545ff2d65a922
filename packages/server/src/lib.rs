// Product Review Service - API Core
//
// Accepts product reviews over HTTP, stores them, and moves them through an
// asynchronous moderation → notification pipeline backed by Redis lists.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
