pub mod cache;
pub mod handlers;
pub mod queries;
pub mod search;
pub mod stats;
