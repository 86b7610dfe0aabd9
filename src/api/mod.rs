pub mod error;
pub mod frames;
pub mod handlers;
pub mod middleware;
