pub mod config;
pub mod dedup;
pub mod filter;
pub mod listener;
pub mod matcher;
pub mod traits;
