pub mod access;
pub mod handlers;
pub mod queries;
pub mod tokens;
pub mod wizard;
